//! Per-slot manager for one lazily resolved widget.
//!
//! A [`ControlHost`] creates the widget named by its metadata, feeds it a
//! deep copy of the value, and mirrors the widget's control into the
//! coordinator's container. Attach and detach never run inside the signal
//! that triggered them: they are posted to the runtime and applied on the
//! next tick, in posting order. For one host the detach of the previous
//! control is always posted before the attach of its replacement.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::control::ControlRef;
use crate::coordinator::AttachmentCoordinator;
use crate::metadata::Metadata;
use crate::runtime::RuntimeHandle;
use crate::signals::{Subject, Subscription};
use crate::value_node::{ControlSlot, SlotBinding};
use crate::widget::{LazyWidget, WidgetContext};
use crate::LazyFormError;

pub type HostId = usize;

static NEXT_HOST_ID: AtomicUsize = AtomicUsize::new(1);

fn next_host_id() -> HostId {
    NEXT_HOST_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostState {
    Uninitialized,
    Built,
    Resetting,
    Destroyed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostDiagnostic {
    /// A widget without the setup capability held a control straight out of
    /// its constructor.
    EagerControl { key: String, widget: &'static str },
}

/// Emitted after a host's control has been attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildCreated {
    pub key: String,
    pub control: ControlRef,
}

struct ChildWidget {
    widget: Box<dyn LazyWidget>,
    slot: ControlSlot,
    lazy_setup: bool,
    _binding: SlotBinding,
}

struct HostInner {
    id: HostId,
    metadata: Arc<Metadata>,
    value: RefCell<Value>,
    coordinator: AttachmentCoordinator,
    state: Cell<HostState>,
    child: RefCell<Option<ChildWidget>>,
    reset_subscription: RefCell<Option<Subscription>>,
    child_created: Subject<ChildCreated>,
    diagnostics: RefCell<Vec<HostDiagnostic>>,
}

impl HostInner {
    fn key(&self) -> &str {
        self.metadata.key()
    }

    fn runtime(&self) -> &RuntimeHandle {
        self.coordinator.runtime()
    }

    /// Discards the current widget (if any) and builds a fresh one.
    fn create_child(self: &Rc<Self>) -> Result<(), LazyFormError> {
        self.release_child();

        let mut widget = self.metadata.widget().create();
        let slot = widget.control().clone();
        let lazy_setup = widget.lazy_setup().is_some();
        let binding = self.bind_slot(&slot)?;
        log::debug!(
            "host #{} built `{}` widget for `{}`",
            self.id,
            self.metadata.widget().name(),
            self.key()
        );
        self.child.replace(Some(ChildWidget {
            widget,
            slot,
            lazy_setup,
            _binding: binding,
        }));
        self.setup_child(true);
        Ok(())
    }

    /// Re-injects the inputs and runs the widget's setup step. `fresh` is
    /// true right after construction.
    fn setup_child(&self, fresh: bool) {
        let cx = WidgetContext::new(self.runtime().clone());
        let mut child = self.child.borrow_mut();
        let Some(child) = child.as_mut() else {
            return;
        };
        child.widget.set_value(self.value.borrow().clone());
        child.widget.set_metadata(self.metadata.clone());

        if child.lazy_setup {
            if let Some(setup) = child.widget.lazy_setup() {
                setup.on_lazy_setup(&cx);
            }
            return;
        }
        if !fresh {
            return;
        }
        if let Some(control) = child.slot.get() {
            let widget = self.metadata.widget().name();
            log::warn!(
                "lazy forms: `{widget}` assigned its control for `{}` in its constructor; \
                 assign it in `on_init` instead",
                self.key()
            );
            self.diagnostics
                .borrow_mut()
                .push(HostDiagnostic::EagerControl {
                    key: self.key().to_owned(),
                    widget,
                });
            self.schedule_attach(control);
        }
        child.widget.on_init(&cx);
    }

    fn bind_slot(self: &Rc<Self>, slot: &ControlSlot) -> Result<SlotBinding, LazyFormError> {
        let on_start = {
            let host = Rc::downgrade(self);
            let slot = slot.clone();
            move || {
                let Some(host) = host.upgrade() else {
                    return;
                };
                // Still the outgoing control: the assignment has not happened yet.
                if let Some(previous) = slot.get() {
                    host.schedule_detach(previous);
                }
            }
        };
        let on_end = {
            let host = Rc::downgrade(self);
            let slot = slot.clone();
            move || {
                let Some(host) = host.upgrade() else {
                    return;
                };
                if let Some(control) = slot.get() {
                    host.schedule_attach(control);
                }
            }
        };
        slot.bind(self.key(), on_start, on_end)
    }

    fn schedule_detach(&self, control: ControlRef) {
        let coordinator = self.coordinator.clone();
        let key = self.key().to_owned();
        log::trace!("host #{} posts detach of `{key}` {control:?}", self.id);
        self.runtime()
            .spawn_task(Box::new(move || coordinator.remove_control(&key, &control)));
    }

    fn schedule_attach(&self, control: ControlRef) {
        let coordinator = self.coordinator.clone();
        let child_created = self.child_created.clone();
        let key = self.key().to_owned();
        log::trace!("host #{} posts attach of `{key}` {control:?}", self.id);
        self.runtime().spawn_task(Box::new(move || {
            coordinator.add_control(&key, control.clone())?;
            child_created.emit(&ChildCreated { key, control });
            Ok(())
        }));
    }

    /// Drops the widget after posting the detach of its control.
    fn release_child(&self) {
        let previous = self.child.borrow_mut().take();
        if let Some(child) = previous {
            if let Some(control) = child.slot.get() {
                self.schedule_detach(control);
            }
            drop(child);
        }
    }

    fn reset(self: &Rc<Self>) -> Result<(), LazyFormError> {
        if self.state.get() == HostState::Destroyed {
            return Ok(());
        }
        self.state.set(HostState::Resetting);
        let lazy_setup = self
            .child
            .borrow()
            .as_ref()
            .is_some_and(|child| child.lazy_setup);
        log::debug!(
            "host #{} resets `{}` ({})",
            self.id,
            self.key(),
            if lazy_setup { "re-setup" } else { "rebuild" }
        );
        let result = if lazy_setup {
            self.setup_child(false);
            Ok(())
        } else {
            self.create_child()
        };
        self.state.set(if self.child.borrow().is_some() {
            HostState::Built
        } else {
            HostState::Uninitialized
        });
        result
    }

    fn destroy(&self) {
        if self.state.replace(HostState::Destroyed) == HostState::Destroyed {
            return;
        }
        log::debug!("host #{} destroyed `{}`", self.id, self.key());
        let subscription = self.reset_subscription.borrow_mut().take();
        drop(subscription);
        self.release_child();
    }
}

/// Owns one lazily created widget and keeps its control attached to the
/// coordinator's container. Dropping the host detaches the control.
pub struct ControlHost {
    inner: Rc<HostInner>, // FUTURE(no_std): replace Rc with arena-managed host handles.
}

impl ControlHost {
    /// Builds the widget described by `metadata` and starts following the
    /// coordinator's resets.
    pub fn new(
        coordinator: &AttachmentCoordinator,
        metadata: Arc<Metadata>,
        value: Value,
    ) -> Result<Self, LazyFormError> {
        let inner = Rc::new(HostInner {
            id: next_host_id(),
            metadata,
            value: RefCell::new(value),
            coordinator: coordinator.clone(),
            state: Cell::new(HostState::Uninitialized),
            child: RefCell::new(None),
            reset_subscription: RefCell::new(None),
            child_created: Subject::new(),
            diagnostics: RefCell::new(Vec::new()),
        });
        inner.create_child()?;
        inner.state.set(HostState::Built);

        let subscription = {
            let host: Weak<HostInner> = Rc::downgrade(&inner);
            coordinator.reset_channel().subscribe(move |_| {
                let Some(host) = host.upgrade() else {
                    return;
                };
                if let Err(err) = host.reset() {
                    host.runtime().report_error(err);
                }
            })
        };
        inner.reset_subscription.replace(Some(subscription));
        Ok(Self { inner })
    }

    pub fn id(&self) -> HostId {
        self.inner.id
    }

    pub fn key(&self) -> &str {
        self.inner.key()
    }

    pub fn metadata(&self) -> &Arc<Metadata> {
        &self.inner.metadata
    }

    pub fn state(&self) -> HostState {
        self.inner.state.get()
    }

    pub fn coordinator(&self) -> &AttachmentCoordinator {
        &self.inner.coordinator
    }

    /// The control the widget currently exposes. Attachment to the container
    /// may still be pending.
    pub fn control(&self) -> Option<ControlRef> {
        self.inner
            .child
            .borrow()
            .as_ref()
            .and_then(|child| child.slot.get())
    }

    pub fn value(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    /// Replaces the input value. The widget sees it on the next reset.
    pub fn set_value(&self, value: Value) {
        self.inner.value.replace(value);
    }

    /// Whether the current widget has the setup capability.
    pub fn has_lazy_setup(&self) -> Option<bool> {
        self.inner
            .child
            .borrow()
            .as_ref()
            .map(|child| child.lazy_setup)
    }

    /// Runs the reset path by hand, as a coordinator reset would.
    pub fn reset(&self) -> Result<(), LazyFormError> {
        self.inner.reset()
    }

    pub fn with_widget<R>(&self, f: impl FnOnce(&mut dyn LazyWidget) -> R) -> Option<R> {
        let mut child = self.inner.child.borrow_mut();
        child.as_mut().map(|child| f(child.widget.as_mut()))
    }

    /// Runs `f` against the widget if it is a `W`.
    pub fn with_widget_as<W: Any, R>(&self, f: impl FnOnce(&mut W) -> R) -> Option<R> {
        let mut child = self.inner.child.borrow_mut();
        let child = child.as_mut()?;
        child.widget.as_mut().as_any_mut().downcast_mut::<W>().map(f)
    }

    pub fn on_child_created(&self) -> &Subject<ChildCreated> {
        &self.inner.child_created
    }

    pub fn diagnostics(&self) -> Vec<HostDiagnostic> {
        self.inner.diagnostics.borrow().clone()
    }
}

impl Drop for ControlHost {
    fn drop(&mut self) {
        self.inner.destroy();
    }
}

impl fmt::Debug for ControlHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlHost")
            .field("id", &self.inner.id)
            .field("key", &self.inner.key())
            .field("state", &self.inner.state.get())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/host_tests.rs"]
mod tests;
