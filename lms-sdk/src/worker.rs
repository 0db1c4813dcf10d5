//! Background tasks driving a session
//!
//! One connection runs:
//!
//! - a **reader** task: frames, decodes and dispatches inbound lines one at a
//!   time while holding the session lock, then executes the resulting effects
//! - a **writer** task: drains the FIFO command queue onto the socket
//! - **timer** tasks: delayed commands and at most one refresh loop per player
//!
//! Timers and callers never touch the socket. They only push onto the queue,
//! so the server sees commands in the order they were enqueued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lms_protocol::{Command, PlayerId, Query};
use lms_state::{Effect, Session, SessionState, StateChange};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::transport::LineReader;

/// Connection status observed by `wait_for_discovery`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Status {
    pub state: SessionState,
    pub connected: bool,
}

/// Producer side of the outbound FIFO
#[derive(Debug, Clone)]
pub(crate) struct CommandQueue {
    tx: mpsc::UnboundedSender<Command>,
    open: Arc<AtomicBool>,
}

impl CommandQueue {
    fn new() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = Self {
            tx,
            open: Arc::new(AtomicBool::new(true)),
        };
        (queue, rx)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Append a command; returns false if the connection is gone
    pub fn push(&self, command: Command) -> bool {
        if !self.is_open() {
            tracing::warn!(command = %command.redacted(), "Dropping command, connection is closed");
            return false;
        }

        if self.tx.send(command).is_err() {
            tracing::warn!("Dropping command, writer has stopped");
            return false;
        }
        true
    }

    /// Mark closed; returns true for the first caller only
    fn close(&self) -> bool {
        self.open.swap(false, Ordering::SeqCst)
    }
}

/// State shared by the client handle and the background tasks
pub(crate) struct Shared {
    pub session: Mutex<Session>,
    pub queue: CommandQueue,
    pub status: watch::Sender<Status>,
    poll_interval: Duration,
    timers: Mutex<Vec<JoinHandle<()>>>,
    pollers: Mutex<HashMap<PlayerId, JoinHandle<()>>>,
}

impl Shared {
    fn new(
        session: Session,
        queue: CommandQueue,
        status: watch::Sender<Status>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            session: Mutex::new(session),
            queue,
            status,
            poll_interval,
            timers: Mutex::new(Vec::new()),
            pollers: Mutex::new(HashMap::new()),
        }
    }

    pub fn publish(&self, change: StateChange) {
        self.session.lock().publish(change);
    }

    /// Carry out effects in order
    pub fn execute(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send(command) => {
                    self.queue.push(command);
                }
                Effect::SendAfter { delay, command } => {
                    let queue = self.queue.clone();
                    self.spawn_timer(async move {
                        tokio::time::sleep(delay).await;
                        if queue.is_open() {
                            queue.push(command);
                        }
                    });
                }
                Effect::StartPolling(player) => {
                    tracing::debug!(player = %player, interval = ?self.poll_interval, "Starting refresh timer");
                    let task = tokio::spawn(poll_player(
                        player.clone(),
                        self.poll_interval,
                        self.queue.clone(),
                    ));
                    if let Some(previous) = self.pollers.lock().insert(player, task) {
                        previous.abort();
                    }
                }
                Effect::StopPolling(player) => {
                    if let Some(task) = self.pollers.lock().remove(&player) {
                        tracing::debug!(player = %player, "Stopping refresh timer");
                        task.abort();
                    }
                }
            }
        }
    }

    fn spawn_timer<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut timers = self.timers.lock();
        timers.retain(|handle| !handle.is_finished());
        timers.push(tokio::spawn(task));
    }

    fn abort_timers(&self) {
        for handle in self.timers.lock().drain(..) {
            handle.abort();
        }
        for (_, handle) in self.pollers.lock().drain() {
            handle.abort();
        }
    }

    /// Tear down after the transport failed; runs once
    pub fn connection_lost(&self, reason: String) {
        if !self.queue.close() {
            return;
        }

        tracing::warn!(%reason, "Connection lost");
        self.abort_timers();
        self.status.send_modify(|status| status.connected = false);
        self.publish(StateChange::ConnectionLost { reason });
    }

    /// Tear down on request; no `ConnectionLost` is published
    pub fn close(&self) {
        if self.queue.close() {
            tracing::info!("Closing connection");
        }
        self.abort_timers();
        self.status.send_modify(|status| status.connected = false);
    }
}

/// Spawn the reader and writer for a fresh session and kick off discovery
pub(crate) fn spawn<R, W>(
    reader: R,
    writer: W,
    session: Session,
    poll_interval: Duration,
    max_line_length: Option<usize>,
) -> (Arc<Shared>, Vec<JoinHandle<()>>)
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let (queue, commands) = CommandQueue::new();
    let (status, _) = watch::channel(Status {
        state: session.state(),
        connected: true,
    });

    let shared = Arc::new(Shared::new(session, queue, status, poll_interval));

    let effects = {
        let mut session = shared.session.lock();
        let effects = session.start();
        let state = session.state();
        shared.status.send_modify(|status| status.state = state);
        effects
    };
    shared.execute(effects);

    let writer_task = tokio::spawn(run_writer(writer, commands, Arc::clone(&shared)));
    let reader_task = tokio::spawn(run_reader(
        LineReader::new(reader, max_line_length),
        Arc::clone(&shared),
    ));

    (shared, vec![reader_task, writer_task])
}

async fn run_reader<R>(mut lines: LineReader<R>, shared: Arc<Shared>)
where
    R: AsyncRead + Unpin,
{
    tracing::debug!("Reader started");

    let reason = loop {
        match lines.next_line().await {
            Ok(Some(Ok(line))) => handle_line(&shared, &line),
            Ok(Some(Err(e))) => {
                tracing::warn!(error = %e, "Undecodable line");
                shared.publish(StateChange::UndecodableLine {
                    reason: e.to_string(),
                });
            }
            Ok(None) => break "server closed the connection".to_string(),
            Err(e) => break format!("read failed: {}", e),
        }
    };

    shared.connection_lost(reason);
}

fn handle_line(shared: &Shared, line: &str) {
    tracing::trace!(line, "Received");

    let effects = {
        let mut session = shared.session.lock();
        let result = session.handle_line(line);

        let state = session.state();
        shared.status.send_if_modified(|status| {
            let changed = status.state != state;
            status.state = state;
            changed
        });

        match result {
            Ok(outcome) => outcome.effects,
            Err(e) => {
                tracing::warn!(error = %e, line, "Rejected line");
                return;
            }
        }
    };

    shared.execute(effects);
}

async fn run_writer<W>(mut writer: W, mut commands: mpsc::UnboundedReceiver<Command>, shared: Arc<Shared>)
where
    W: AsyncWrite + Unpin,
{
    tracing::debug!("Writer started");

    while let Some(command) = commands.recv().await {
        tracing::debug!(command = %command.redacted(), "Sending");

        let written = async {
            writer.write_all(command.to_line().as_bytes()).await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = written {
            shared.connection_lost(format!("write failed: {}", e));
            break;
        }
    }

    tracing::debug!("Writer stopped");
}

/// Refresh one player every `period`, first tick one period after start
async fn poll_player(player: PlayerId, period: Duration, queue: CommandQueue) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !queue.is_open() {
            break;
        }

        tracing::trace!(player = %player, "Refreshing player");
        for query in Query::ON_REFRESH {
            queue.push(Command::query(&player, query));
        }
    }
}
