//! Batch upload to the remote collector.

pub mod http;
pub mod resolver;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::event::Event;

/// Why a single upload attempt failed.
///
/// Transient and permanent failures are not distinguished: every failure
/// leaves the batch queued for the next flush window.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS or timeout failure from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The collector answered with a non-success status.
    #[error("collector returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// The batch could not be serialized.
    #[error("batch encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// Client construction or other local failure.
    #[error("upload client error: {0}")]
    Client(String),
}

/// Sends one batch, exactly one attempt per call.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Returns `Ok(())` only when the collector acknowledged the batch.
    async fn send(&self, batch: &[Event]) -> Result<(), TransportError>;
}

#[derive(Serialize)]
struct BatchDocument<'a> {
    events: &'a [Event],
}

/// Serializes a batch as `{"events": [...]}`.
pub fn encode_batch(batch: &[Event]) -> Result<String, TransportError> {
    Ok(serde_json::to_string(&BatchDocument { events: batch })?)
}
