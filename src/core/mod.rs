//! In-memory session log and flush scheduling.

/// Debounce window and single-flight state machine.
pub mod scheduler;
/// Ordered pending-event log.
pub mod session;
