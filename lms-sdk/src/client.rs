//! LmsClient - Main entry point for the SDK

use std::sync::Arc;

use lms_protocol::{Command, PlayerId, Query};
use lms_state::{Player, SessionState, StateChange};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::worker::{self, Shared};

/// Connection to one Logitech Media Server
///
/// Discovery starts as soon as the client is created. Reads return clones of
/// the current player state; commands are queued and never wait for a reply.
///
/// # Example
///
/// ```rust,ignore
/// use lms_sdk::{ClientConfig, LmsClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), lms_sdk::ClientError> {
///     let client = LmsClient::connect(ClientConfig::new().with_host("192.168.1.10")).await?;
///
///     for player in client.wait_for_discovery().await? {
///         println!("{} is {}", player.name().unwrap_or("?"), player.mode());
///     }
///
///     let kitchen = client.player_by_name("Kitchen").ok_or(lms_sdk::ClientError::ConnectionClosed)?;
///     client.adjust_volume(kitchen.id(), 5);
///
///     let mut changes = client.subscribe();
///     while let Ok(change) = changes.recv().await {
///         println!("{:?}", change);
///     }
///     Ok(())
/// }
/// ```
pub struct LmsClient {
    shared: Arc<Shared>,
    config: ClientConfig,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl LmsClient {
    /// Open a TCP connection to `config.host:config.port` and start discovery
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let stream = open(&config).await?;
        Self::from_stream(stream, config)
    }

    /// Like `connect`, also returning a change receiver that sees discovery
    pub async fn connect_subscribed(
        config: ClientConfig,
    ) -> Result<(Self, broadcast::Receiver<StateChange>)> {
        let stream = open(&config).await?;
        Self::from_stream_subscribed(stream, config)
    }

    /// Start a session over an already-connected stream
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_stream<S>(stream: S, config: ClientConfig) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        Self::from_stream_subscribed(stream, config).map(|(client, _)| client)
    }

    /// Like `from_stream`, also returning a change receiver
    ///
    /// The receiver is subscribed before the background tasks start, so it
    /// observes every change of the session, including `PlayerRegistered`
    /// and `DiscoveryComplete`.
    pub fn from_stream_subscribed<S>(
        stream: S,
        config: ClientConfig,
    ) -> Result<(Self, broadcast::Receiver<StateChange>)>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        config.validate()?;

        let (reader, writer) = tokio::io::split(stream);
        let session = lms_state::Session::new(config.session_options());
        let changes = session.subscribe();
        let (shared, workers) = worker::spawn(
            reader,
            writer,
            session,
            config.poll_interval,
            config.max_line_length,
        );

        let client = Self {
            shared,
            config,
            workers: Mutex::new(workers),
        };
        Ok((client, changes))
    }

    // ========================================================================
    // State
    // ========================================================================

    /// All known players in discovery order
    pub fn players(&self) -> Vec<Player> {
        self.shared.session.lock().registry().iter().cloned().collect()
    }

    pub fn player(&self, id: &PlayerId) -> Option<Player> {
        self.shared.session.lock().player(id).cloned()
    }

    /// First player whose reported name matches exactly
    pub fn player_by_name(&self, name: &str) -> Option<Player> {
        self.shared
            .session
            .lock()
            .registry()
            .find_by_name(name)
            .cloned()
    }

    pub fn session_state(&self) -> SessionState {
        self.shared.session.lock().state()
    }

    /// Player count announced by the server, `None` before it answered
    pub fn expected_player_count(&self) -> Option<usize> {
        self.shared.session.lock().expected_count()
    }

    pub fn is_connected(&self) -> bool {
        self.shared.queue.is_open()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Receive every state change from now on
    ///
    /// Discovery runs in the background from the moment the client is
    /// created, so `PlayerRegistered` and `DiscoveryComplete` may already
    /// have been published. Use `wait_for_discovery` to await completion, or
    /// `from_stream_subscribed` / `connect_subscribed` to observe every change.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.shared.session.lock().subscribe()
    }

    /// Wait until every announced player has been identified
    ///
    /// Returns the players known at that point. Gives up after
    /// `discovery_timeout`, or as soon as the connection is lost.
    pub async fn wait_for_discovery(&self) -> Result<Vec<Player>> {
        let mut status = self.shared.status.subscribe();

        // The watch guard must be released before the session lock is taken
        let listening = match tokio::time::timeout(
            self.config.discovery_timeout,
            status.wait_for(|s| s.state == SessionState::Listening || !s.connected),
        )
        .await
        {
            Ok(Ok(current)) => Some(current.state == SessionState::Listening),
            Ok(Err(_)) => Some(false),
            Err(_) => None,
        };

        match listening {
            Some(true) => Ok(self.players()),
            Some(false) => Err(ClientError::ConnectionClosed),
            None => Err(ClientError::DiscoveryTimeout {
                state: self.session_state(),
            }),
        }
    }

    /// Stop every background task and close the connection
    pub fn shutdown(&self) {
        self.shared.close();
        for handle in self.workers.lock().drain(..) {
            handle.abort();
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub fn power_on(&self, player: &PlayerId) {
        self.send(Command::Power {
            player: player.clone(),
            on: true,
        });
    }

    pub fn power_off(&self, player: &PlayerId) {
        self.send(Command::Power {
            player: player.clone(),
            on: false,
        });
    }

    /// Set an absolute volume
    pub fn set_volume(&self, player: &PlayerId, volume: i64) {
        self.send(Command::SetVolume {
            player: player.clone(),
            volume,
        });
    }

    /// Change the volume by `delta`; the server echoes the relative form
    pub fn adjust_volume(&self, player: &PlayerId, delta: i64) {
        self.send(Command::AdjustVolume {
            player: player.clone(),
            delta,
        });
    }

    pub fn play(&self, player: &PlayerId) {
        self.send(Command::Play {
            player: player.clone(),
        });
    }

    pub fn pause(&self, player: &PlayerId) {
        self.send(Command::Pause {
            player: player.clone(),
        });
    }

    pub fn stop(&self, player: &PlayerId) {
        self.send(Command::Stop {
            player: player.clone(),
        });
    }

    /// Issue the periodic refresh queries now
    pub fn refresh(&self, player: &PlayerId) {
        for query in Query::ON_REFRESH {
            self.send(Command::query(player, query));
        }
    }

    fn send(&self, command: Command) {
        if let Some(player) = command.player() {
            if !self.shared.session.lock().registry().contains(player) {
                tracing::debug!(player = %player, "Command for a player not yet discovered");
            }
        }
        self.shared.queue.push(command);
    }
}

async fn open(config: &ClientConfig) -> Result<TcpStream> {
    config.validate()?;
    let address = config.address();

    tracing::info!(%address, "Connecting");
    let stream = tokio::time::timeout(
        config.connect_timeout,
        TcpStream::connect((config.host.as_str(), config.port)),
    )
    .await
    .map_err(|_| ClientError::ConnectTimeout {
        address: address.clone(),
    })?
    .map_err(|source| ClientError::Connect {
        address: address.clone(),
        source,
    })?;

    stream.set_nodelay(true)?;
    Ok(stream)
}

impl Drop for LmsClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for LmsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmsClient")
            .field("address", &self.config.address())
            .field("connected", &self.is_connected())
            .field("state", &self.session_state())
            .finish()
    }
}
