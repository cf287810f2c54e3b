use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::control::ControlRef;
use crate::operations::{CompositeAdapter, ControlOperations};
use crate::runtime::RuntimeHandle;
use crate::signals::Subject;
use crate::LazyFormError;

/// Published after the coordinator forwarded an operation to its adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachmentEvent {
    Added { key: String, control: ControlRef },
    Removed { key: String, control: ControlRef },
}

struct CoordinatorInner {
    runtime: RuntimeHandle,
    adapter: RefCell<Option<CompositeAdapter>>,
    reset: Subject<()>,
    events: Subject<AttachmentEvent>,
    generation: Cell<u64>,
}

/// Binds hosts to the composite container of one form.
///
/// Clones share state. Only the owning form calls [`initialize`]; hosts use
/// [`add_control`], [`remove_control`] and the reset channel.
///
/// [`initialize`]: AttachmentCoordinator::initialize
/// [`add_control`]: AttachmentCoordinator::add_control
/// [`remove_control`]: AttachmentCoordinator::remove_control
#[derive(Clone)]
pub struct AttachmentCoordinator {
    inner: Rc<CoordinatorInner>,
}

impl AttachmentCoordinator {
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self {
            inner: Rc::new(CoordinatorInner {
                runtime,
                adapter: RefCell::new(None),
                reset: Subject::new(),
                events: Subject::new(),
                generation: Cell::new(0),
            }),
        }
    }

    /// Binds `container` and broadcasts a reset. On error the previous
    /// binding is kept and nothing is broadcast.
    pub fn initialize(&self, container: &ControlRef) -> Result<(), LazyFormError> {
        let adapter = CompositeAdapter::new(container)?;
        self.inner.adapter.replace(Some(adapter));
        let generation = self.inner.generation.get() + 1;
        self.inner.generation.set(generation);
        log::debug!(
            "coordinator bound to {container:?} (generation {generation}); resetting {} host(s)",
            self.inner.reset.subscriber_count()
        );
        self.inner.reset.emit(&());
        Ok(())
    }

    pub fn add_control(&self, key: &str, control: ControlRef) -> Result<(), LazyFormError> {
        let adapter = self.current_adapter()?;
        log::trace!("attach `{key}` -> {control:?}");
        adapter.add_control(key, control.clone());
        self.inner.events.emit(&AttachmentEvent::Added {
            key: key.to_owned(),
            control,
        });
        Ok(())
    }

    pub fn remove_control(&self, key: &str, control: &ControlRef) -> Result<(), LazyFormError> {
        let adapter = self.current_adapter()?;
        if adapter.remove_control(key, control) {
            log::trace!("detach `{key}` -> {control:?}");
            self.inner.events.emit(&AttachmentEvent::Removed {
                key: key.to_owned(),
                control: control.clone(),
            });
        } else {
            log::trace!("detach `{key}` -> {control:?} skipped; not attached");
        }
        Ok(())
    }

    // The adapter is cloned out so listeners of `events` may call back in.
    fn current_adapter(&self) -> Result<CompositeAdapter, LazyFormError> {
        self.inner
            .adapter
            .borrow()
            .clone()
            .ok_or(LazyFormError::NotInitialized)
    }

    pub fn reset_channel(&self) -> &Subject<()> {
        &self.inner.reset
    }

    pub fn events(&self) -> &Subject<AttachmentEvent> {
        &self.inner.events
    }

    pub fn runtime(&self) -> &RuntimeHandle {
        &self.inner.runtime
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.adapter.borrow().is_some()
    }

    /// Container currently bound, if any.
    pub fn container(&self) -> Option<ControlRef> {
        self.inner
            .adapter
            .borrow()
            .as_ref()
            .map(|adapter| adapter.container().clone())
    }

    /// Number of successful `initialize` calls.
    pub fn generation(&self) -> u64 {
        self.inner.generation.get()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
