//! Platform abstraction for the lazy forms runtime.
//!
//! The runtime never drives itself: it queues deferred work and asks the
//! host platform for a tick. Whoever implements [`RuntimeScheduler`] decides
//! when `drain_tasks` is called (an event loop, a test harness, ...).

use crate::LazyFormError;

/// Schedules work for the lazy forms runtime.
///
/// Implementations must be shareable behind an `Arc`; the runtime itself is
/// single-threaded and only ever calls the scheduler from its own thread.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host run a tick soon.
    fn schedule_tick(&self);

    /// Receive an error raised by a deferred task or a reset handler.
    ///
    /// Errors reaching this channel are not retried.
    fn report_error(&self, error: LazyFormError) {
        log::error!("lazy forms task failed: {error}");
    }
}
