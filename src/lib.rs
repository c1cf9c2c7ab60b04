//! Durable client-side analytics event queue.
//!
//! Events are appended to an in-memory session, backed up to a single
//! snapshot, and uploaded in batches after a fixed cooldown window. At most
//! one upload is in flight; only a confirmed upload removes events, and only
//! the prefix that was sent.
//!
//! # Examples
//!
//! Session bookkeeping with [`core::session::Session`]:
//! ```
//! use eventq::{core::session::Session, event::Event};
//!
//! let mut session = Session::new();
//! session.append(Event::new("levelStart", "level:3"));
//! session.append(Event::new("coinsSpending", "coinNumber:40"));
//! let batch = session.snapshot_all();
//! session.append(Event::new("rewardClaim", "rewardBundle:gold"));
//!
//! session.remove_sent_prefix(batch.len()).expect("prefix");
//! assert_eq!(session.events(), &[Event::new("rewardClaim", "rewardBundle:gold")]);
//! ```
//!
//! Runtime usage with a file snapshot and HTTP collector:
//! ```no_run
//! use std::sync::Arc;
//!
//! use eventq::{
//!     persist::file::FileSnapshotStore,
//!     runtime::handle::{spawn_event_queue, RuntimeConfig},
//!     upload::http::{HttpUploader, HttpUploaderConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = FileSnapshotStore::in_dir("/tmp/my-game");
//! let uploader = HttpUploader::new(HttpUploaderConfig {
//!     server_url: "https://collector.example.com/events".to_string(),
//!     timeout_ms: None,
//! })
//! .expect("uploader");
//! let queue = spawn_event_queue(Box::new(store), Arc::new(uploader), RuntimeConfig::default());
//! queue.track_level_start(3);
//! queue.track("rewardClaim", "rewardBundle:gold");
//! queue.shutdown().await.expect("store session");
//! # }
//! ```

/// Session log and flush scheduling.
pub mod core;
/// Event record.
pub mod event;
/// Snapshot persistence abstraction and backends.
pub mod persist;
/// Convenience trackers for common game events.
pub mod presets;
/// Single-owner queue runtime and event stream.
pub mod runtime;
/// Collector upload abstraction and HTTP implementation.
pub mod upload;
