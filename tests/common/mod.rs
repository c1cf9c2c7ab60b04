#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{broadcast, broadcast::error::RecvError, Semaphore};
use tokio::time::Duration;

use eventq::{
    core::session::Session,
    event::Event,
    persist::{PersistError, PersistResult, SnapshotStore},
    runtime::{events::QueueEvent, handle::RuntimeConfig},
    upload::{TransportError, Uploader},
};

pub fn ev(kind: &str, data: &str) -> Event {
    Event::new(kind, data)
}

pub fn config(cooldown_ms: u64, backup_every_events: usize) -> RuntimeConfig {
    RuntimeConfig {
        cooldown_before_send_ms: cooldown_ms,
        backup_every_events,
        ..RuntimeConfig::default()
    }
}

/// Waits for the first event matching `pred`, skipping everything else.
pub async fn wait_for(
    rx: &mut broadcast::Receiver<QueueEvent>,
    pred: impl Fn(&QueueEvent) -> bool,
) -> QueueEvent {
    tokio::time::timeout(Duration::from_secs(600), async {
        loop {
            match rx.recv().await {
                Ok(evt) if pred(&evt) => return evt,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("event stream closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for queue event")
}

/// Snapshot store kept in memory and shared between clones, so a second
/// queue can restore what the first one saved.
#[derive(Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<Session>>>,
    saves: Arc<AtomicUsize>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Option<Session> {
        self.slot.lock().expect("lock").clone()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> PersistResult<Option<Session>> {
        Ok(self.slot.lock().expect("lock").clone())
    }

    fn save(&mut self, session: &Session) -> PersistResult<()> {
        if self.fail_saves {
            return Err(PersistError::Message("disk full".to_string()));
        }
        *self.slot.lock().expect("lock") = Some(session.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Uploader that records every batch, answers from a script (success once
/// the script runs out), and optionally holds each send until released.
#[derive(Default)]
pub struct FakeUploader {
    batches: Mutex<Vec<Vec<Event>>>,
    outcomes: Mutex<VecDeque<bool>>,
    gate: Option<Semaphore>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeUploader {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn scripted(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    /// Lets `n` held sends complete.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn batches(&self) -> Vec<Vec<Event>> {
        self.batches.lock().expect("lock").clone()
    }

    pub fn calls(&self) -> usize {
        self.batches.lock().expect("lock").len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Uploader for FakeUploader {
    async fn send(&self, batch: &[Event]) -> Result<(), TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.batches.lock().expect("lock").push(batch.to_vec());

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        let ok = self.outcomes.lock().expect("lock").pop_front().unwrap_or(true);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if ok {
            Ok(())
        } else {
            Err(TransportError::Status {
                status: 503,
                body: "scripted failure".to_string(),
            })
        }
    }
}
