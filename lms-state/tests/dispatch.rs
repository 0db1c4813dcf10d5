//! Dispatch and correlation tests driven through `Session`
//!
//! Lines are fed exactly as the runtime would after framing and decoding.

use proptest::prelude::*;
use rstest::rstest;
use tokio::sync::broadcast;

use lms_protocol::{Command, Query};
use lms_state::{
    Dispatch, Effect, Mode, PlayerId, PlayerProperty, Session, SessionOptions,
    SessionState, StateChange, StateError,
};

// ============================================================================
// Test Helpers
// ============================================================================

const ADDRESS: &str = "AA:BB:CC:DD:EE:FF";

fn player_id() -> PlayerId {
    PlayerId::new(ADDRESS)
}

/// Session that has completed discovery with the given addresses
fn listening_session(addresses: &[&str]) -> Session {
    let mut session = Session::new(SessionOptions::default());
    session.start();
    session
        .handle_line(&format!("player count {}", addresses.len()))
        .unwrap();
    for (index, address) in addresses.iter().enumerate() {
        session
            .handle_line(&format!("player id {} {}", index, address))
            .unwrap();
    }
    assert_eq!(session.state(), SessionState::Listening);
    session
}

fn sent(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Send(c) => Some(c.to_string()),
            _ => None,
        })
        .collect()
}

fn drain(rx: &mut broadcast::Receiver<StateChange>) -> Vec<StateChange> {
    let mut out = Vec::new();
    while let Ok(change) = rx.try_recv() {
        out.push(change);
    }
    out
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_player_count_requests_each_index() {
    let mut session = Session::new(SessionOptions::default());
    session.start();

    let outcome = session.handle_line("player count 2").unwrap();

    assert_eq!(
        outcome.dispatch,
        Dispatch::Server {
            keyword: "player count"
        }
    );
    assert_eq!(sent(&outcome.effects), vec!["player id 0 ?", "player id 1 ?"]);
    assert_eq!(session.expected_count(), Some(2));
}

#[test]
fn test_barrier_fires_once_on_last_registration() {
    let mut session = Session::new(SessionOptions::default());
    let mut changes = session.subscribe();
    session.start();
    session.handle_line("player count 2").unwrap();

    let first = session.handle_line("player id 0 00:00:00:00:00:01").unwrap();
    assert!(!sent(&first.effects).contains(&"listen 1".to_string()));
    assert_eq!(session.state(), SessionState::AwaitingIds);

    let second = session.handle_line("player id 1 00:00:00:00:00:02").unwrap();
    assert!(sent(&second.effects).contains(&"listen 1".to_string()));
    assert_eq!(session.state(), SessionState::Listening);

    // A late duplicate must not re-open the barrier
    let dup = session.handle_line("player id 1 00:00:00:00:00:02").unwrap();
    assert!(!sent(&dup.effects).contains(&"listen 1".to_string()));
    assert!(!dup
        .effects
        .iter()
        .any(|e| matches!(e, Effect::StartPolling(_))));

    let completions = drain(&mut changes)
        .into_iter()
        .filter(|c| matches!(c, StateChange::DiscoveryComplete { .. }))
        .count();
    assert_eq!(completions, 1);
}

#[test]
fn test_last_registration_effect_order() {
    let mut session = Session::new(SessionOptions::default());
    session.start();
    session.handle_line("player count 1").unwrap();

    let outcome = session.handle_line(&format!("player id 0 {}", ADDRESS)).unwrap();

    let id = player_id();
    assert_eq!(outcome.effects[0], Effect::StartPolling(id.clone()));
    assert_eq!(
        sent(&outcome.effects),
        vec![
            "listen 1".to_string(),
            format!("{} signalstrength ?", ADDRESS),
            format!("{} name ?", ADDRESS),
            format!("{} power ?", ADDRESS),
            format!("{} mixer volume ?", ADDRESS),
        ]
    );
}

#[test]
fn test_recount_keeps_one_refresh_timer_per_player() {
    let mut session = Session::new(SessionOptions::default());
    session.start();

    let lines = [
        "player count 2",
        "player id 0 aa:aa",
        "player count 2",
        "player id 0 aa:aa",
        "player id 1 bb:bb",
    ];

    // Replay the timer effects the way the runtime applies them
    let mut running = std::collections::HashMap::<PlayerId, usize>::new();
    for line in lines {
        for effect in session.handle_line(line).unwrap().effects {
            match effect {
                Effect::StartPolling(id) => *running.entry(id).or_default() += 1,
                Effect::StopPolling(id) => {
                    running.remove(&id);
                }
                _ => {}
            }
        }
        assert!(running.values().all(|&n| n == 1), "after {:?}: {:?}", line, running);
    }

    assert_eq!(session.state(), SessionState::Listening);
    assert_eq!(running.len(), 2);
    assert!(running.contains_key(&PlayerId::new("aa:aa")));
    assert!(running.contains_key(&PlayerId::new("bb:bb")));
}

#[test]
fn test_recount_stops_timers_of_dropped_players() {
    let mut session = Session::new(SessionOptions::default());
    session.start();
    session.handle_line("player count 2").unwrap();
    session.handle_line("player id 0 aa:aa").unwrap();

    let outcome = session.handle_line("player count 1").unwrap();
    assert_eq!(outcome.effects[0], Effect::StopPolling(PlayerId::new("aa:aa")));
    assert_eq!(sent(&outcome.effects), vec!["player id 0 ?"]);
    assert!(session.registry().is_empty());
}

#[rstest]
#[case("player id 0 ?")]
#[case("player id zero aa:bb")]
#[case("player id 0")]
fn test_malformed_player_id_is_rejected(#[case] line: &str) {
    let mut session = Session::new(SessionOptions::default());
    session.start();
    session.handle_line("player count 1").unwrap();

    let err = session.handle_line(line).unwrap_err();
    assert!(matches!(
        err,
        StateError::InvalidPayload {
            keyword: "player id",
            ..
        }
    ));
    assert!(session.registry().is_empty());
    assert_eq!(session.state(), SessionState::AwaitingIds);
}

#[test]
fn test_bad_player_count_leaves_state_alone() {
    let mut session = Session::new(SessionOptions::default());
    session.start();

    assert!(session.handle_line("player count lots").is_err());
    assert_eq!(session.state(), SessionState::AwaitingCount);
    assert_eq!(session.expected_count(), None);
}

// ============================================================================
// Player lines
// ============================================================================

#[test]
fn test_play_sets_mode_and_queries_title() {
    let mut session = listening_session(&[ADDRESS]);
    let mut changes = session.subscribe();

    let outcome = session.handle_line(&format!("{} play", ADDRESS)).unwrap();

    assert_eq!(
        outcome.dispatch,
        Dispatch::Player {
            player_id: player_id(),
            keyword: "play"
        }
    );
    assert_eq!(session.player(&player_id()).unwrap().mode(), Mode::Play);
    assert_eq!(
        outcome.effects,
        vec![Effect::Send(Command::query(&player_id(), Query::CurrentTitle))]
    );
    assert_eq!(
        drain(&mut changes),
        vec![StateChange::PropertyChanged {
            player_id: player_id(),
            property: PlayerProperty::Mode(Mode::Play),
        }]
    );
}

#[test]
fn test_power_on_schedules_delayed_mode_query() {
    let mut session = listening_session(&[ADDRESS]);

    let outcome = session.handle_line(&format!("{} power 1", ADDRESS)).unwrap();

    assert_eq!(session.player(&player_id()).unwrap().power(), Some(true));
    match outcome.effects.as_slice() {
        [Effect::SendAfter { delay, command }] => {
            assert_eq!(*delay, session.options().mode_query_delay);
            assert_eq!(command.to_string(), format!("{} mode ?", ADDRESS));
        }
        other => panic!("unexpected effects: {:?}", other),
    }
}

#[test]
fn test_power_off_forces_mode_off() {
    let mut session = listening_session(&[ADDRESS]);
    session.handle_line(&format!("{} play", ADDRESS)).unwrap();

    let outcome = session.handle_line(&format!("{} power 0", ADDRESS)).unwrap();

    let player = session.player(&player_id()).unwrap();
    assert_eq!(player.power(), Some(false));
    assert_eq!(player.mode(), Mode::Off);
    assert!(outcome.effects.is_empty());
}

#[rstest]
#[case("stop", Mode::Stop)]
#[case("pause", Mode::Pause)]
#[case("mode play", Mode::Play)]
#[case("mode pause", Mode::Pause)]
#[case("mode shuffle", Mode::Unknown)]
fn test_mode_lines(#[case] text: &str, #[case] expected: Mode) {
    let mut session = listening_session(&[ADDRESS]);
    session.handle_line(&format!("{} {}", ADDRESS, text)).unwrap();
    assert_eq!(session.player(&player_id()).unwrap().mode(), expected);
}

#[test]
fn test_name_with_spaces_and_signal_strength() {
    let mut session = listening_session(&[ADDRESS]);
    session
        .handle_line(&format!("{} name Living Room", ADDRESS))
        .unwrap();
    session
        .handle_line(&format!("{} signalstrength 87", ADDRESS))
        .unwrap();

    let player = session.player(&player_id()).unwrap();
    assert_eq!(player.name(), Some("Living Room"));
    assert_eq!(player.signal_strength(), Some(87));
}

#[test]
fn test_bare_name_clears_name() {
    let mut session = listening_session(&[ADDRESS]);
    session.handle_line(&format!("{} name Kitchen", ADDRESS)).unwrap();
    session.handle_line(&format!("{} name", ADDRESS)).unwrap();

    assert_eq!(session.player(&player_id()).unwrap().name(), Some(""));
}

#[test]
fn test_missing_payload_is_an_error() {
    let mut session = listening_session(&[ADDRESS]);

    let err = session.handle_line(&format!("{} power", ADDRESS)).unwrap_err();
    assert_eq!(err, StateError::MissingPayload { keyword: "power" });
    assert_eq!(session.player(&player_id()).unwrap().power(), None);
}

#[test]
fn test_mixer_volume_goes_through_catch_all() {
    let mut session = listening_session(&[ADDRESS]);

    session
        .handle_line(&format!("{} mixer volume 20", ADDRESS))
        .unwrap();
    let outcome = session
        .handle_line(&format!("{} mixer volume +5", ADDRESS))
        .unwrap();

    assert_eq!(
        outcome.dispatch,
        Dispatch::Forwarded {
            player_id: player_id()
        }
    );
    assert_eq!(session.player(&player_id()).unwrap().volume(), 25);
}

#[test]
fn test_unknown_player_text_becomes_event() {
    let mut session = listening_session(&[ADDRESS]);
    let mut changes = session.subscribe();

    session
        .handle_line(&format!("{} playlist newsong Radio 1", ADDRESS))
        .unwrap();

    assert_eq!(
        drain(&mut changes),
        vec![StateChange::PlayerEvent {
            player_id: player_id(),
            name: "playlist".to_string(),
            args: vec!["newsong".to_string(), "Radio".to_string(), "1".to_string()],
        }]
    );
}

#[test]
fn test_lines_for_second_player_are_attributed_correctly() {
    let other = "11:22:33:44:55:66";
    let mut session = listening_session(&[ADDRESS, other]);

    session.handle_line(&format!("{} pause", other)).unwrap();

    assert_eq!(
        session.player(&PlayerId::new(other)).unwrap().mode(),
        Mode::Pause
    );
    assert_eq!(session.player(&player_id()).unwrap().mode(), Mode::Unknown);
}

#[test]
fn test_unhandled_line_reports_once_and_mutates_nothing() {
    let mut session = listening_session(&[ADDRESS]);
    let before = session.player(&player_id()).cloned();
    let mut changes = session.subscribe();

    let outcome = session.handle_line("99:99:99:99:99:99 power 1").unwrap();

    assert_eq!(outcome.dispatch, Dispatch::Unhandled);
    assert!(outcome.effects.is_empty());
    assert_eq!(session.player(&player_id()).cloned(), before);
    assert_eq!(
        drain(&mut changes),
        vec![StateChange::UnhandledLine {
            line: "99:99:99:99:99:99 power 1".to_string()
        }]
    );
}

#[test]
fn test_player_lines_before_registration_are_unhandled() {
    let mut session = Session::new(SessionOptions::default());
    session.start();

    let outcome = session.handle_line(&format!("{} play", ADDRESS)).unwrap();
    assert_eq!(outcome.dispatch, Dispatch::Unhandled);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Relative volume updates accumulate; absolute ones replace
    #[test]
    fn prop_volume_accumulates(start in -100i64..100, deltas in prop::collection::vec(-20i64..20, 0..10)) {
        let mut session = listening_session(&[ADDRESS]);
        session.handle_line(&format!("{} mixer volume {}", ADDRESS, start)).unwrap();

        let mut expected = start;
        for delta in deltas {
            session.handle_line(&format!("{} mixer volume {:+}", ADDRESS, delta)).unwrap();
            expected += delta;
        }

        prop_assert_eq!(session.player(&player_id()).unwrap().volume(), expected);
    }
}
