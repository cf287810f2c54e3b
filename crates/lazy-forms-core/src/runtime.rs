use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::RuntimeScheduler;
use crate::LazyFormError;

/// Deferred unit of work. Errors are handed to the scheduler.
pub type Task = Box<dyn FnOnce() -> Result<(), LazyFormError> + 'static>;

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    needs_tick: Cell<bool>,
    pending_tasks: RefCell<VecDeque<Task>>, // FUTURE(no_std): replace VecDeque with ring buffer.
    ticks: Cell<u64>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            needs_tick: Cell::new(false),
            pending_tasks: RefCell::new(VecDeque::new()),
            ticks: Cell::new(0),
        }
    }

    fn schedule(&self) {
        self.needs_tick.set(true);
        self.scheduler.schedule_tick();
    }

    fn enqueue_task(&self, task: Task) {
        self.pending_tasks.borrow_mut().push_back(task);
        self.schedule();
    }

    /// Runs the tasks queued before this call. Tasks posted while they run
    /// stay queued for the next tick.
    fn drain_tasks(&self) -> usize {
        let tasks: Vec<Task> = {
            let mut pending = self.pending_tasks.borrow_mut();
            pending.drain(..).collect()
        };
        self.ticks.set(self.ticks.get() + 1);
        let count = tasks.len();
        for task in tasks {
            if let Err(err) = task() {
                self.scheduler.report_error(err);
            }
        }
        if !self.has_tasks() {
            self.needs_tick.set(false);
        }
        count
    }

    fn has_tasks(&self) -> bool {
        !self.pending_tasks.borrow().is_empty()
    }

    fn pending_count(&self) -> usize {
        self.pending_tasks.borrow().len()
    }
}

/// Single-threaded cooperative runtime owning the deferred task queue.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>, // FUTURE(no_std): replace Rc with arena-managed runtime storage.
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn needs_tick(&self) -> bool {
        self.inner.needs_tick.get()
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.inner.has_tasks()
    }

    /// Number of ticks drained so far.
    pub fn tick_count(&self) -> u64 {
        self.inner.ticks.get()
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_tick(&self) {}
}

#[cfg(test)]
#[derive(Default)]
pub struct TestScheduler {
    errors: std::sync::Mutex<Vec<LazyFormError>>,
}

#[cfg(test)]
impl TestScheduler {
    pub fn take_errors(&self) -> Vec<LazyFormError> {
        std::mem::take(&mut *self.errors.lock().unwrap())
    }
}

#[cfg(test)]
impl RuntimeScheduler for TestScheduler {
    fn schedule_tick(&self) {}

    fn report_error(&self, error: LazyFormError) {
        self.errors.lock().unwrap().push(error);
    }
}

#[cfg(test)]
pub struct TestRuntime {
    runtime: Runtime,
    scheduler: Arc<TestScheduler>,
}

#[cfg(test)]
impl TestRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(TestScheduler::default());
        Self {
            runtime: Runtime::new(scheduler.clone()),
            scheduler,
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn take_errors(&self) -> Vec<LazyFormError> {
        self.scheduler.take_errors()
    }

    /// Drains ticks until the queue is empty and returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        self.handle().run_until_idle()
    }
}

/// Weak handle used by coordinators and hosts to post deferred work.
#[derive(Clone)]
pub struct RuntimeHandle(pub(crate) Weak<RuntimeInner>);

impl RuntimeHandle {
    pub fn schedule(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.schedule();
        }
    }

    /// Posts `task` to the next tick. Without a live runtime the task runs
    /// immediately and its error is logged.
    pub fn spawn_task(&self, task: Task) {
        if let Some(inner) = self.0.upgrade() {
            inner.enqueue_task(task);
        } else if let Err(err) = task() {
            log::error!("lazy forms task failed without a runtime: {err}");
        }
    }

    /// Runs one tick. Returns the number of tasks executed.
    pub fn drain_tasks(&self) -> usize {
        self.0
            .upgrade()
            .map(|inner| inner.drain_tasks())
            .unwrap_or(0)
    }

    /// Runs ticks until no task is pending. Returns the number of ticks.
    pub fn run_until_idle(&self) -> usize {
        let mut ticks = 0;
        while self.has_pending_tasks() {
            self.drain_tasks();
            ticks += 1;
        }
        ticks
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_tasks())
            .unwrap_or(false)
    }

    pub fn pending_task_count(&self) -> usize {
        self.0
            .upgrade()
            .map(|inner| inner.pending_count())
            .unwrap_or(0)
    }

    pub fn report_error(&self, error: LazyFormError) {
        match self.0.upgrade() {
            Some(inner) => inner.scheduler.report_error(error),
            None => log::error!("lazy forms error without a runtime: {error}"),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}
