//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides a concrete [`RuntimeScheduler`] for `lazy-forms-core`.
//! Applications construct a [`StdRuntime`], hand its handle to their forms
//! and call [`StdRuntime::drain_tasks`] whenever a tick was requested.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use lazy_forms_core::{LazyFormError, Runtime, RuntimeHandle, RuntimeScheduler};

type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that records tick requests with atomics and forwards them to an
/// optional waker.
pub struct StdScheduler {
    tick_requested: AtomicBool,
    tick_waker: RwLock<Option<Waker>>,
    errors_reported: AtomicUsize,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            tick_requested: AtomicBool::new(false),
            tick_waker: RwLock::new(None),
            errors_reported: AtomicUsize::new(0),
        }
    }

    /// Returns whether a tick has been requested since the last call.
    pub fn take_tick_request(&self) -> bool {
        self.tick_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker that will be invoked whenever a new tick is scheduled.
    pub fn set_tick_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self
            .tick_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    /// Clears any registered tick waker.
    pub fn clear_tick_waker(&self) {
        *self
            .tick_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of deferred-task failures seen so far.
    pub fn errors_reported(&self) -> usize {
        self.errors_reported.load(Ordering::SeqCst)
    }

    fn wake(&self) {
        let waker = self
            .tick_waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field("tick_requested", &self.tick_requested.load(Ordering::SeqCst))
            .field("errors_reported", &self.errors_reported())
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn schedule_tick(&self) {
        self.tick_requested.store(true, Ordering::SeqCst);
        self.wake();
    }

    fn report_error(&self, error: LazyFormError) {
        self.errors_reported.fetch_add(1, Ordering::SeqCst);
        log::error!("lazy forms deferred task failed: {error}");
    }
}

/// Convenience container bundling the standard scheduler with a runtime.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    runtime: Runtime,
}

impl StdRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self { scheduler, runtime }
    }

    /// Returns a [`lazy_forms_core::Runtime`] configured with the standard scheduler.
    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn take_tick_request(&self) -> bool {
        self.scheduler.take_tick_request()
    }

    pub fn set_tick_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_tick_waker(waker);
    }

    pub fn clear_tick_waker(&self) {
        self.scheduler.clear_tick_waker();
    }

    /// Runs one tick and returns the number of tasks it executed.
    pub fn drain_tasks(&self) -> usize {
        self.runtime_handle().drain_tasks()
    }

    /// Runs ticks until the queue is empty. Returns the number of ticks.
    pub fn run_until_idle(&self) -> usize {
        self.runtime_handle().run_until_idle()
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("ticks", &self.runtime.tick_count())
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}
