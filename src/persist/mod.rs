pub mod file;
pub mod sqlite;

use thiserror::Error;
use tracing::{error, info};

use crate::core::session::Session;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("snapshot io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot document is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot database failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("{0}")]
    Message(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Durable home of the single session snapshot.
///
/// Every `save` fully replaces the previous snapshot.
pub trait SnapshotStore: Send {
    /// Reads the stored snapshot, `Ok(None)` when none was ever written.
    fn load(&self) -> PersistResult<Option<Session>>;
    fn save(&mut self, session: &Session) -> PersistResult<()>;
}

/// Loads the stored session, falling back to an empty one.
///
/// A missing snapshot starts a new session; an unreadable one is logged and
/// discarded.
pub fn restore_session(store: &dyn SnapshotStore) -> Session {
    match store.load() {
        Ok(Some(session)) => {
            info!(pending = session.len(), "session restored from snapshot");
            session
        }
        Ok(None) => {
            info!("no snapshot found, new session created");
            Session::new()
        }
        Err(err) => {
            error!(error = %err, "snapshot unreadable, starting with an empty session");
            Session::new()
        }
    }
}
