//! Single-owner async queue loop and its event stream.

/// Event stream types emitted by the queue loop.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;
