use std::{future::Future, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, oneshot, Mutex},
    task::JoinHandle,
    time::{Duration, Instant},
};
use tracing::{debug, error, info, warn};

use crate::{
    core::{
        scheduler::{FlushScheduler, FlushState},
        session::Session,
    },
    event::Event,
    persist::{restore_session, PersistError, SnapshotStore},
    upload::{TransportError, Uploader},
};

use super::events::{PersistReason, QueueEvent};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("event queue is no longer running")]
    ChannelClosed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file malformed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Fixed window between the event that opens it and the flush.
    pub cooldown_before_send_ms: u64,
    /// Back up the session after this many tracked events; 0 disables.
    pub backup_every_events: usize,
    pub event_stream_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cooldown_before_send_ms: 3_000,
            backup_every_events: 10,
            event_stream_capacity: 1024,
        }
    }
}

impl RuntimeConfig {
    /// Reads a JSON config; missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_before_send_ms)
    }
}

/// Cheap, cloneable entry point to a running event queue.
///
/// The queue task stops, after one last snapshot, once every handle is dropped.
#[derive(Clone)]
pub struct EventQueueHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    events_tx: broadcast::Sender<QueueEvent>,
}

enum Command {
    Track {
        event: Event,
    },
    Pending {
        resp: oneshot::Sender<Vec<Event>>,
    },
    State {
        resp: oneshot::Sender<FlushState>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
}

struct FlushOutcome {
    sent: usize,
    result: Result<(), TransportError>,
}

type SharedStore = Arc<Mutex<Box<dyn SnapshotStore>>>;

/// Starts the queue: restores the stored session, then serves commands.
///
/// Must be called inside a tokio runtime. Commands sent before the restore
/// finishes are applied after the restored events.
pub fn spawn_event_queue(
    store: Box<dyn SnapshotStore>,
    uploader: Arc<dyn Uploader>,
    config: RuntimeConfig,
) -> EventQueueHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
    let (events_tx, _) = broadcast::channel::<QueueEvent>(config.event_stream_capacity.max(1));

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<FlushOutcome>();
        let mut queue = QueueLoop::start(store, uploader, config, events_tx_loop, done_tx).await;

        loop {
            let deadline = queue.scheduler.deadline();
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break; };
                    queue.handle_command(cmd).await;
                }
                Some(outcome) = done_rx.recv() => {
                    queue.finish_flush(outcome).await;
                }
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    queue.begin_flush();
                }
            }
        }

        let _ = queue.persist(PersistReason::Close).await;
        debug!("event queue stopped");
    });

    EventQueueHandle { cmd_tx, events_tx }
}

impl EventQueueHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events_tx.subscribe()
    }

    /// Records one event. Never fails from the caller's side; if the queue
    /// has stopped the event is dropped with a warning.
    pub fn track(&self, kind: impl Into<String>, data: impl Into<String>) {
        let event = Event::new(kind, data);
        if self.cmd_tx.send(Command::Track { event }).is_err() {
            warn!("event queue stopped, event dropped");
        }
    }

    /// Events not yet confirmed sent, in send order.
    pub async fn pending(&self) -> Result<Vec<Event>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Pending { resp: tx })
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    pub async fn flush_state(&self) -> Result<FlushState, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::State { resp: tx })
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Saves the current session now.
    ///
    /// Does not wait for, cancel, or start any upload, and leaves the queue
    /// running so a suspended host can resume.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Blocking form of [`EventQueueHandle::shutdown`] for synchronous host
    /// callbacks. Panics if called from within an async context.
    pub fn shutdown_blocking(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.blocking_recv().map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Saves the session when `signal` resolves.
    ///
    /// The watcher does not keep the queue alive on its own.
    pub fn watch_shutdown<F>(&self, signal: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let weak_tx = self.cmd_tx.downgrade();
        tokio::spawn(async move {
            signal.await;
            let Some(cmd_tx) = weak_tx.upgrade() else {
                return;
            };
            info!("shutdown signal received");

            let (tx, rx) = oneshot::channel();
            if cmd_tx.send(Command::Shutdown { resp: tx }).is_err() {
                return;
            }
            drop(cmd_tx);
            match rx.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(error = %err, "session not stored on shutdown"),
                Err(_) => warn!("event queue stopped before shutdown completed"),
            }
        })
    }
}

struct QueueLoop {
    session: Session,
    scheduler: FlushScheduler,
    store: SharedStore,
    uploader: Arc<dyn Uploader>,
    events_tx: broadcast::Sender<QueueEvent>,
    done_tx: mpsc::UnboundedSender<FlushOutcome>,
    config: RuntimeConfig,
    tracked_since_backup: usize,
}

impl QueueLoop {
    async fn start(
        store: Box<dyn SnapshotStore>,
        uploader: Arc<dyn Uploader>,
        config: RuntimeConfig,
        events_tx: broadcast::Sender<QueueEvent>,
        done_tx: mpsc::UnboundedSender<FlushOutcome>,
    ) -> Self {
        let store = Arc::new(Mutex::new(store));
        let session = load_session(&store).await;
        let _ = events_tx.send(QueueEvent::Restored {
            pending: session.len(),
        });

        let mut queue = Self {
            session,
            scheduler: FlushScheduler::new(config.cooldown()),
            store,
            uploader,
            events_tx,
            done_tx,
            config,
            tracked_since_backup: 0,
        };
        queue.check_for_unsent_events();
        queue
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Track { event } => {
                debug!(kind = %event.kind, data = %event.data, "event added");
                self.session.append(event);
                let _ = self.events_tx.send(QueueEvent::Tracked {
                    pending: self.session.len(),
                });

                self.tracked_since_backup += 1;
                if self.config.backup_every_events != 0
                    && self.tracked_since_backup >= self.config.backup_every_events
                {
                    self.tracked_since_backup = 0;
                    let _ = self.persist(PersistReason::Backup).await;
                }

                self.check_for_unsent_events();
            }
            Command::Pending { resp } => {
                let _ = resp.send(self.session.snapshot_all());
            }
            Command::State { resp } => {
                let _ = resp.send(self.scheduler.state());
            }
            Command::Shutdown { resp } => {
                let out = self
                    .persist(PersistReason::Shutdown)
                    .await
                    .map_err(RuntimeError::from);
                let _ = resp.send(out);
            }
        }
    }

    fn check_for_unsent_events(&mut self) {
        let pending = self.session.len();
        if self.scheduler.check_for_unsent(pending, Instant::now()) {
            debug!(
                pending,
                cooldown_ms = self.config.cooldown_before_send_ms,
                "waiting for other events"
            );
            let _ = self.events_tx.send(QueueEvent::FlushScheduled { pending });
        }
    }

    fn begin_flush(&mut self) {
        let batch = self.session.snapshot_all();
        match self.scheduler.begin_send(batch.len(), Instant::now()) {
            Ok(true) => {}
            Ok(false) => {
                debug!("flush window closed with nothing pending");
                return;
            }
            Err(err) => {
                warn!(error = %err, "flush timer fired outside its window");
                return;
            }
        }

        info!(events = batch.len(), "sending events");
        let _ = self.events_tx.send(QueueEvent::FlushStarted { batch: batch.len() });

        let uploader = Arc::clone(&self.uploader);
        let done_tx = self.done_tx.clone();
        tokio::spawn(async move {
            let result = uploader.send(&batch).await;
            let _ = done_tx.send(FlushOutcome {
                sent: batch.len(),
                result,
            });
        });
    }

    async fn finish_flush(&mut self, outcome: FlushOutcome) {
        if let Err(err) = self.scheduler.finish_send() {
            error!(error = %err, "send completed while none was in flight");
        }

        match outcome.result {
            Ok(()) => match self.session.remove_sent_prefix(outcome.sent) {
                Ok(()) => {
                    info!(
                        sent = outcome.sent,
                        remaining = self.session.len(),
                        "events successfully sent"
                    );
                    let _ = self.events_tx.send(QueueEvent::FlushSucceeded {
                        sent: outcome.sent,
                        remaining: self.session.len(),
                    });
                }
                Err(err) => {
                    error!(error = %err, "sent batch no longer matches the session front");
                }
            },
            Err(err) => {
                warn!(batch = outcome.sent, error = %err, "events not sent");
                let _ = self.events_tx.send(QueueEvent::FlushFailed {
                    batch: outcome.sent,
                    reason: err.to_string(),
                });
            }
        }

        let _ = self.persist(PersistReason::Flush).await;
        self.check_for_unsent_events();
    }

    async fn persist(&self, reason: PersistReason) -> Result<(), PersistError> {
        let snapshot = self.session.clone();
        let pending = snapshot.len();
        let store = Arc::clone(&self.store);

        let result = match tokio::task::spawn_blocking(move || {
            let mut store = store.blocking_lock();
            store.save(&snapshot)
        })
        .await
        {
            Ok(inner) => inner,
            Err(e) => Err(PersistError::Message(format!("join error: {e}"))),
        };

        match &result {
            Ok(()) => {
                debug!(?reason, pending, "session stored");
                let _ = self.events_tx.send(QueueEvent::Persisted { reason, pending });
            }
            Err(err) => {
                error!(?reason, error = %err, "session store failed");
                let _ = self.events_tx.send(QueueEvent::PersistFailed {
                    reason,
                    error: err.to_string(),
                });
            }
        }
        result
    }
}

async fn load_session(store: &SharedStore) -> Session {
    let store_ref = Arc::clone(store);
    match tokio::task::spawn_blocking(move || {
        let store = store_ref.blocking_lock();
        restore_session(&**store)
    })
    .await
    {
        Ok(session) => session,
        Err(err) => {
            error!(error = %err, "snapshot restore task failed");
            Session::new()
        }
    }
}
