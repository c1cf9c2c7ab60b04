//! Destination URL resolution, including the debug override used to
//! simulate slow and failing collectors.

use std::sync::atomic::{AtomicBool, Ordering};

/// Base used by [`DebugUrlResolver`] when none is given.
pub const DEFAULT_DEBUG_BASE: &str = "https://httpstat.us";

const SLOW_RESPONSE_QUERY: &str = "?sleep=3000";

/// Picks the URL for the next upload.
pub trait UrlResolver: Send + Sync {
    fn resolve(&self) -> String;
}

/// Always the same collector URL.
#[derive(Debug, Clone)]
pub struct FixedUrl(pub String);

impl UrlResolver for FixedUrl {
    fn resolve(&self) -> String {
        self.0.clone()
    }
}

/// Routes uploads to a status-echo service while debug mode is on.
///
/// The toggles are atomics so a debug UI can flip them while the queue runs.
#[derive(Debug)]
pub struct DebugUrlResolver {
    server_url: String,
    debug_base: String,
    debug_mode: AtomicBool,
    long_request: AtomicBool,
    failed_request: AtomicBool,
}

impl DebugUrlResolver {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_debug_base(server_url, DEFAULT_DEBUG_BASE)
    }

    pub fn with_debug_base(server_url: impl Into<String>, debug_base: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            debug_base: debug_base.into(),
            debug_mode: AtomicBool::new(false),
            long_request: AtomicBool::new(false),
            failed_request: AtomicBool::new(false),
        }
    }

    pub fn set_debug_mode(&self, on: bool) {
        self.debug_mode.store(on, Ordering::Relaxed);
    }

    /// Asks the echo service to hold the response for three seconds.
    pub fn set_long_request(&self, on: bool) {
        self.long_request.store(on, Ordering::Relaxed);
    }

    /// Asks the echo service to answer 503.
    pub fn set_failed_request(&self, on: bool) {
        self.failed_request.store(on, Ordering::Relaxed);
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode.load(Ordering::Relaxed)
    }

    pub fn long_request(&self) -> bool {
        self.long_request.load(Ordering::Relaxed)
    }

    pub fn failed_request(&self) -> bool {
        self.failed_request.load(Ordering::Relaxed)
    }
}

impl UrlResolver for DebugUrlResolver {
    fn resolve(&self) -> String {
        if !self.debug_mode() {
            return self.server_url.clone();
        }

        let status = if self.failed_request() { 503 } else { 200 };
        let query = if self.long_request() {
            SLOW_RESPONSE_QUERY
        } else {
            ""
        };
        format!("{}/{status}{query}", self.debug_base.trim_end_matches('/'))
    }
}
