use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};

use lazy_forms_core::{
    AttachmentEvent, ControlRef, LazyForm, LazyFormError, LazyModel, Runtime, RuntimeHandle,
    RuntimeScheduler, Subscription,
};
use serde::Serialize;

/// Installs `env_logger` for test binaries. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Scheduler that counts tick requests and keeps reported errors for
/// assertions instead of logging them.
#[derive(Default)]
pub struct RecordingScheduler {
    tick_requests: Mutex<usize>,
    errors: Mutex<Vec<LazyFormError>>,
}

impl RecordingScheduler {
    pub fn tick_requests(&self) -> usize {
        *self
            .tick_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn take_errors(&self) -> Vec<LazyFormError> {
        std::mem::take(
            &mut *self
                .errors
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}

impl RuntimeScheduler for RecordingScheduler {
    fn schedule_tick(&self) {
        *self
            .tick_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn report_error(&self, error: LazyFormError) {
        log::debug!("recorded deferred error: {error}");
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }
}

/// Headless harness for exercising lazy forms in tests.
///
/// `FormTestRule` owns a runtime driven by a [`RecordingScheduler`], the
/// form under test, and a log of the attachment events its coordinator
/// published. Ticks only run when the test asks for them.
pub struct FormTestRule {
    form: Option<LazyForm>, // Must drop before `runtime`.
    events_subscription: Option<Subscription>,
    events: Rc<RefCell<Vec<AttachmentEvent>>>,
    runtime: Runtime,
    scheduler: Arc<RecordingScheduler>,
}

impl FormTestRule {
    pub fn new() -> Self {
        init_logging();
        let scheduler = Arc::new(RecordingScheduler::default());
        Self {
            form: None,
            events_subscription: None,
            events: Rc::new(RefCell::new(Vec::new())),
            runtime: Runtime::new(scheduler.clone()),
            scheduler,
        }
    }

    /// Creates a form bound to `container`, replacing any previous one.
    pub fn set_form(&mut self, container: ControlRef) -> Result<&mut LazyForm, LazyFormError> {
        let form = LazyForm::new(self.runtime_handle(), container)?;
        let events = Rc::clone(&self.events);
        self.events_subscription = Some(
            form.coordinator()
                .events()
                .subscribe(move |event| events.borrow_mut().push(event.clone())),
        );
        Ok(self.form.insert(form))
    }

    /// Creates a form bound to `container`, renders `model` into it and pumps
    /// until every child is attached.
    pub fn set_model<M>(&mut self, container: ControlRef, model: &M) -> Result<(), LazyFormError>
    where
        M: LazyModel + Serialize,
    {
        self.set_form(container)?.bind_model(model)?;
        self.pump_until_idle();
        Ok(())
    }

    pub fn form(&self) -> Option<&LazyForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut LazyForm> {
        self.form.as_mut()
    }

    /// Drops the form under test. Its detaches stay queued until the next
    /// tick.
    pub fn clear_form(&mut self) -> Option<ControlRef> {
        self.events_subscription = None;
        self.form.take().map(|form| form.form().clone())
    }

    /// Runs exactly one tick and returns the number of tasks it executed.
    pub fn advance_tick(&mut self) -> usize {
        self.runtime_handle().drain_tasks()
    }

    /// Runs ticks until nothing is pending. Returns the number of ticks.
    pub fn pump_until_idle(&mut self) -> usize {
        self.runtime_handle().run_until_idle()
    }

    pub fn pending_task_count(&self) -> usize {
        self.runtime_handle().pending_task_count()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn scheduler(&self) -> &RecordingScheduler {
        &self.scheduler
    }

    pub fn take_errors(&self) -> Vec<LazyFormError> {
        self.scheduler.take_errors()
    }

    /// Attachment events published by the current form's coordinator.
    pub fn take_events(&self) -> Vec<AttachmentEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl Default for FormTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `FormTestRule`.
pub fn run_test_form<R>(f: impl FnOnce(&mut FormTestRule) -> R) -> R {
    let mut rule = FormTestRule::new();
    f(&mut rule)
}
