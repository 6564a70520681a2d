//! tokio wiring of the page, Relay-Source, Coordinator and Inspector Client.
//!
//! Each component runs as one task with a single-threaded event loop over
//! unbounded channels; the state machines themselves live in `scanner` and
//! `relay` and never see tokio.

pub mod client;
pub mod coordinator_task;
pub mod page_task;
pub mod source_task;

/// Current instant on the tokio clock (paused clocks included).
pub(crate) fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}
