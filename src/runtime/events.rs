//! Runtime event stream payloads.

/// Why a snapshot was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistReason {
    /// Periodic backup after every Nth tracked event.
    Backup,
    /// After a flush attempt, successful or not.
    Flush,
    /// Host lifecycle asked for state to be saved.
    Shutdown,
    /// Every handle was dropped and the queue stopped.
    Close,
}

/// Events emitted from the queue's single-owner loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    /// The startup snapshot was read.
    Restored {
        /// Events carried over from the previous run.
        pending: usize,
    },
    /// An event was appended to the session.
    Tracked {
        /// Session length after the append.
        pending: usize,
    },
    /// A debounce window opened.
    FlushScheduled {
        /// Events pending when the window opened.
        pending: usize,
    },
    /// A batch left for the collector.
    FlushStarted {
        /// Batch size.
        batch: usize,
    },
    /// The collector acknowledged the batch and it was dropped from the session.
    FlushSucceeded {
        /// Events removed from the front of the session.
        sent: usize,
        /// Events still pending, appended while the batch was in flight.
        remaining: usize,
    },
    /// The upload failed; the batch stays queued.
    FlushFailed {
        /// Size of the batch that was not sent.
        batch: usize,
        /// Rendered transport error.
        reason: String,
    },
    /// A snapshot was written.
    Persisted {
        /// Trigger for the write.
        reason: PersistReason,
        /// Events in the written snapshot.
        pending: usize,
    },
    /// A snapshot write failed; the in-memory session is unaffected.
    PersistFailed {
        /// Trigger for the write.
        reason: PersistReason,
        /// Rendered storage error.
        error: String,
    },
}
