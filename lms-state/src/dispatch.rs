//! Line dispatch and correlation
//!
//! The server tags nothing with a request id. A line is attributed purely by
//! its shape:
//!
//! 1. **Server-scoped**: `<keyword> <payload>` for `login`, `player count`,
//!    `player id` and `listen`.
//! 2. **Player keyword**: `<address> <keyword> <payload>` or exactly
//!    `<address> <keyword>`, for each keyword in `PLAYER_MATCHERS` order and
//!    each known player in registration order.
//! 3. **Player catch-all**: `<address> <text>`, handed to
//!    `Player::handle_forwarded` once every keyword has failed.
//!
//! Anything else is reported as an unhandled line. Both matcher tables are
//! static so dispatch order is fixed and testable.

use std::time::Duration;

use lms_protocol::{Command, PlayerId, Query};
use tokio::sync::broadcast;

use crate::change::StateChange;
use crate::error::{Result, StateError};
use crate::model::{Forwarded, Mode, Player, PlayerProperty};
use crate::registry::Registration;
use crate::session::{Effect, Session, SessionState};

/// What a line was attributed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A server-scoped keyword handled the line
    Server { keyword: &'static str },
    /// A player keyword handler handled the line
    Player {
        player_id: PlayerId,
        keyword: &'static str,
    },
    /// The line went to the player's catch-all handler
    Forwarded { player_id: PlayerId },
    /// Nothing matched
    Unhandled,
}

/// Result of dispatching one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub dispatch: Dispatch,
    /// Effects to execute, in order
    pub effects: Vec<Effect>,
}

// ============================================================================
// Matching
// ============================================================================

/// Match `<keyword> <payload>`; the payload may be empty
pub fn match_server<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    line.strip_prefix(keyword)?.strip_prefix(' ')
}

/// Match `<address> <keyword> <payload>` or `<address> <keyword>`
///
/// Returns `Some(Some(payload))`, `Some(None)` for the bare form, or `None`.
pub fn match_player_keyword<'a>(
    line: &'a str,
    player: &PlayerId,
    keyword: &str,
) -> Option<Option<&'a str>> {
    let after = match_player_any(line, player)?.strip_prefix(keyword)?;
    if after.is_empty() {
        Some(None)
    } else {
        after.strip_prefix(' ').map(Some)
    }
}

/// Match `<address> <text>`
pub fn match_player_any<'a>(line: &'a str, player: &PlayerId) -> Option<&'a str> {
    line.strip_prefix(player.as_str())?.strip_prefix(' ')
}

// ============================================================================
// Matcher tables
// ============================================================================

type ServerHandler = fn(&mut Session, &str, &mut Vec<Effect>) -> Result<()>;

struct ServerMatcher {
    keyword: &'static str,
    handler: ServerHandler,
}

const SERVER_MATCHERS: [ServerMatcher; 4] = [
    ServerMatcher {
        keyword: "login",
        handler: on_login,
    },
    ServerMatcher {
        keyword: "player count",
        handler: on_player_count,
    },
    ServerMatcher {
        keyword: "player id",
        handler: on_player_id,
    },
    ServerMatcher {
        keyword: "listen",
        handler: on_listen,
    },
];

type PlayerHandler = fn(&mut PlayerContext<'_>, Option<&str>) -> Result<()>;

struct PlayerMatcher {
    keyword: &'static str,
    handler: PlayerHandler,
}

const PLAYER_MATCHERS: [PlayerMatcher; 8] = [
    PlayerMatcher {
        keyword: "signalstrength",
        handler: on_signal_strength,
    },
    PlayerMatcher {
        keyword: "power",
        handler: on_power,
    },
    PlayerMatcher {
        keyword: "name",
        handler: on_name,
    },
    PlayerMatcher {
        keyword: "current_title",
        handler: on_current_title,
    },
    PlayerMatcher {
        keyword: "mode",
        handler: on_mode,
    },
    PlayerMatcher {
        keyword: "play",
        handler: on_play,
    },
    PlayerMatcher {
        keyword: "stop",
        handler: on_stop,
    },
    PlayerMatcher {
        keyword: "pause",
        handler: on_pause,
    },
];

/// Keywords with dedicated player handlers, in match order
pub fn player_keywords() -> impl Iterator<Item = &'static str> {
    PLAYER_MATCHERS.iter().map(|m| m.keyword)
}

/// Keywords with dedicated server handlers, in match order
pub fn server_keywords() -> impl Iterator<Item = &'static str> {
    SERVER_MATCHERS.iter().map(|m| m.keyword)
}

// ============================================================================
// Dispatch
// ============================================================================

pub(crate) fn dispatch(session: &mut Session, line: &str) -> Result<Outcome> {
    let mut effects = Vec::new();

    for matcher in &SERVER_MATCHERS {
        if let Some(payload) = match_server(line, matcher.keyword) {
            tracing::trace!(keyword = matcher.keyword, payload, "Server line");
            (matcher.handler)(session, payload, &mut effects)?;
            return Ok(Outcome {
                dispatch: Dispatch::Server {
                    keyword: matcher.keyword,
                },
                effects,
            });
        }
    }

    let Session {
        registry,
        options,
        changes_tx,
        ..
    } = &mut *session;

    for matcher in &PLAYER_MATCHERS {
        let found = registry.iter_mut().find_map(|player| {
            match_player_keyword(line, player.id(), matcher.keyword).map(|payload| (player, payload))
        });

        if let Some((player, payload)) = found {
            let player_id = player.id().clone();
            tracing::trace!(player = %player_id, keyword = matcher.keyword, ?payload, "Player line");

            let mut ctx = PlayerContext {
                player,
                effects: &mut effects,
                changes_tx,
                mode_query_delay: options.mode_query_delay,
            };
            (matcher.handler)(&mut ctx, payload)?;

            return Ok(Outcome {
                dispatch: Dispatch::Player {
                    player_id,
                    keyword: matcher.keyword,
                },
                effects,
            });
        }
    }

    let forwarded = registry
        .iter_mut()
        .find_map(|player| match_player_any(line, player.id()).map(|rest| (player, rest)));

    if let Some((player, rest)) = forwarded {
        let player_id = player.id().clone();
        let change = match player.handle_forwarded(rest)? {
            Forwarded::Property(property) => StateChange::PropertyChanged {
                player_id: player_id.clone(),
                property,
            },
            Forwarded::Event { name, args } => {
                tracing::trace!(player = %player_id, event = %name, "Player event");
                StateChange::PlayerEvent {
                    player_id: player_id.clone(),
                    name,
                    args,
                }
            }
        };
        let _ = changes_tx.send(change);

        return Ok(Outcome {
            dispatch: Dispatch::Forwarded { player_id },
            effects,
        });
    }

    tracing::warn!(line, "Unhandled line");
    session.publish(StateChange::UnhandledLine {
        line: line.to_string(),
    });

    Ok(Outcome {
        dispatch: Dispatch::Unhandled,
        effects,
    })
}

// ============================================================================
// Server handlers
// ============================================================================

fn on_login(session: &mut Session, _payload: &str, effects: &mut Vec<Effect>) -> Result<()> {
    if session.state == SessionState::Listening {
        tracing::debug!("Ignoring login response while listening");
        return Ok(());
    }

    session.state = SessionState::AwaitingCount;
    effects.push(Effect::Send(Command::PlayerCount));
    Ok(())
}

fn on_player_count(session: &mut Session, payload: &str, effects: &mut Vec<Effect>) -> Result<()> {
    if session.state == SessionState::Listening {
        tracing::debug!(payload, "Ignoring player count while listening");
        return Ok(());
    }

    let count: usize = parse_number("player count", payload)?;
    tracing::debug!(count, "Server reported player count");

    session.state = SessionState::AwaitingIds;
    effects.extend(session.registry.ids().cloned().map(Effect::StopPolling));
    let complete = session.registry.reset(count);
    effects.extend((0..count).map(|n| Effect::Send(Command::PlayerIndex(n))));

    if complete {
        session.enter_listening(effects);
    }
    Ok(())
}

fn on_player_id(session: &mut Session, payload: &str, effects: &mut Vec<Effect>) -> Result<()> {
    let invalid = |reason: &str| StateError::InvalidPayload {
        keyword: "player id",
        payload: payload.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = payload.split_whitespace();
    let index: usize = parts
        .next()
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| invalid("expected '<index> <address>'"))?;
    let address = parts
        .next()
        .filter(|a| *a != "?")
        .ok_or_else(|| invalid("expected '<index> <address>'"))?;

    let player_id = PlayerId::new(address);
    let outcome = session.registry.register(index, player_id.clone());

    match outcome.registration {
        Registration::New => {
            tracing::debug!(index, player = %player_id, "Registered player");
            session.publish(StateChange::PlayerRegistered {
                player_id: player_id.clone(),
                index,
            });
            effects.push(Effect::StartPolling(player_id.clone()));
        }
        Registration::Existing => {
            tracing::debug!(index, player = %player_id, "Player already registered");
        }
    }

    if outcome.barrier_reached {
        session.enter_listening(effects);
    }

    effects.extend(
        Query::ON_REGISTER
            .iter()
            .map(|query| Effect::Send(Command::query(&player_id, *query))),
    );
    Ok(())
}

fn on_listen(_session: &mut Session, _payload: &str, _effects: &mut Vec<Effect>) -> Result<()> {
    Ok(())
}

// ============================================================================
// Player handlers
// ============================================================================

/// What a player handler may touch
struct PlayerContext<'a> {
    player: &'a mut Player,
    effects: &'a mut Vec<Effect>,
    changes_tx: &'a broadcast::Sender<StateChange>,
    mode_query_delay: Duration,
}

impl PlayerContext<'_> {
    fn set(&mut self, property: PlayerProperty) {
        let property = self.player.set_property(property);
        let _ = self.changes_tx.send(StateChange::PropertyChanged {
            player_id: self.player.id().clone(),
            property,
        });
    }

    fn query(&mut self, query: Query) {
        self.effects
            .push(Effect::Send(Command::query(self.player.id(), query)));
    }
}

fn on_signal_strength(ctx: &mut PlayerContext<'_>, payload: Option<&str>) -> Result<()> {
    let strength = parse_number("signalstrength", require("signalstrength", payload)?)?;
    ctx.set(PlayerProperty::SignalStrength(strength));
    Ok(())
}

fn on_power(ctx: &mut PlayerContext<'_>, payload: Option<&str>) -> Result<()> {
    let on = parse_number::<i64>("power", require("power", payload)?)? != 0;
    ctx.set(PlayerProperty::Power(on));

    if on {
        let command = Command::query(ctx.player.id(), Query::Mode);
        ctx.effects.push(Effect::SendAfter {
            delay: ctx.mode_query_delay,
            command,
        });
    } else {
        ctx.set(PlayerProperty::Mode(Mode::Off));
    }
    Ok(())
}

fn on_name(ctx: &mut PlayerContext<'_>, payload: Option<&str>) -> Result<()> {
    ctx.set(PlayerProperty::Name(payload.unwrap_or_default().to_string()));
    Ok(())
}

fn on_current_title(ctx: &mut PlayerContext<'_>, payload: Option<&str>) -> Result<()> {
    ctx.set(PlayerProperty::CurrentTitle(
        payload.unwrap_or_default().to_string(),
    ));
    Ok(())
}

fn on_mode(ctx: &mut PlayerContext<'_>, payload: Option<&str>) -> Result<()> {
    let payload = require("mode", payload)?;
    let mode = Mode::from_payload(payload);
    if mode == Mode::Unknown {
        tracing::debug!(player = %ctx.player.id(), payload, "Unrecognized mode");
    }
    ctx.set(PlayerProperty::Mode(mode));
    Ok(())
}

fn on_play(ctx: &mut PlayerContext<'_>, _payload: Option<&str>) -> Result<()> {
    ctx.set(PlayerProperty::Mode(Mode::Play));
    ctx.query(Query::CurrentTitle);
    Ok(())
}

fn on_stop(ctx: &mut PlayerContext<'_>, _payload: Option<&str>) -> Result<()> {
    ctx.set(PlayerProperty::Mode(Mode::Stop));
    Ok(())
}

fn on_pause(ctx: &mut PlayerContext<'_>, _payload: Option<&str>) -> Result<()> {
    ctx.set(PlayerProperty::Mode(Mode::Pause));
    Ok(())
}

// ============================================================================
// Payload helpers
// ============================================================================

fn require<'a>(keyword: &'static str, payload: Option<&'a str>) -> Result<&'a str> {
    payload.ok_or(StateError::MissingPayload { keyword })
}

fn parse_number<T: std::str::FromStr>(keyword: &'static str, payload: &str) -> Result<T> {
    payload
        .trim()
        .parse()
        .map_err(|_| StateError::InvalidPayload {
            keyword,
            payload: payload.to_string(),
            reason: "expected an integer".to_string(),
        })
}
