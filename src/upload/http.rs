use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::Event;

use super::resolver::{FixedUrl, UrlResolver};
use super::{TransportError, Uploader, encode_batch};

/// Name of the single form field carrying the batch document.
pub const FORM_FIELD: &str = "data";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpUploaderConfig {
    pub server_url: String,
    /// Per-request timeout. `None` leaves the client's default in place.
    pub timeout_ms: Option<u64>,
}

/// Posts each batch as a form-encoded `data` field.
pub struct HttpUploader {
    client: reqwest::Client,
    resolver: Arc<dyn UrlResolver>,
}

impl HttpUploader {
    pub fn new(config: HttpUploaderConfig) -> Result<Self, TransportError> {
        if config.server_url.trim().is_empty() {
            return Err(TransportError::Client(
                "collector url cannot be empty".to_string(),
            ));
        }
        let timeout_ms = config.timeout_ms;
        Self::with_resolver(Arc::new(FixedUrl(config.server_url.trim().to_string())), timeout_ms)
    }

    /// Builds an uploader whose destination is chosen per request.
    pub fn with_resolver(
        resolver: Arc<dyn UrlResolver>,
        timeout_ms: Option<u64>,
    ) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(ms) = timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder
            .build()
            .map_err(|err| TransportError::Client(format!("http client build failed: {err}")))?;
        Ok(Self { client, resolver })
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn send(&self, batch: &[Event]) -> Result<(), TransportError> {
        let body = encode_batch(batch)?;
        let url = self.resolver.resolve();
        debug!(%url, events = batch.len(), "posting batch");

        let response = self
            .client
            .post(&url)
            .form(&[(FORM_FIELD, body.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
