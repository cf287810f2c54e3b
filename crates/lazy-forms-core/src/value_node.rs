use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::control::ControlRef;
use crate::signals::{Subject, Subscription};
use crate::LazyFormError;

struct ControlSlotInner {
    control: RefCell<Option<ControlRef>>,
    set_start: Subject<()>,
    set_end: Subject<()>,
    bound: Cell<bool>,
}

/// Instrumented holder for a widget's control.
///
/// Widgets own one slot for their whole life and assign their control
/// through [`ControlSlot::set`]. Every assignment is bracketed by the
/// `control_set_start` and `control_set_end` signals, both delivered
/// synchronously before `set` returns.
#[derive(Clone)]
pub struct ControlSlot {
    inner: Rc<ControlSlotInner>,
}

impl ControlSlot {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ControlSlotInner {
                control: RefCell::new(None),
                set_start: Subject::new(),
                set_end: Subject::new(),
                bound: Cell::new(false),
            }),
        }
    }

    /// A slot that already holds `control`, without signalling.
    pub fn with_control(control: ControlRef) -> Self {
        let slot = Self::new();
        *slot.inner.control.borrow_mut() = Some(control);
        slot
    }

    pub fn get(&self) -> Option<ControlRef> {
        self.inner.control.borrow().clone()
    }

    pub fn is_set(&self) -> bool {
        self.inner.control.borrow().is_some()
    }

    pub fn set(&self, control: ControlRef) {
        self.inner.set_start.emit(&());
        *self.inner.control.borrow_mut() = Some(control);
        self.inner.set_end.emit(&());
    }

    pub fn control_set_start(&self) -> &Subject<()> {
        &self.inner.set_start
    }

    pub fn control_set_end(&self) -> &Subject<()> {
        &self.inner.set_end
    }

    pub fn is_bound(&self) -> bool {
        self.inner.bound.get()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Claims the slot for one coordinating host.
    pub(crate) fn bind(
        &self,
        key: &str,
        on_start: impl Fn() + 'static,
        on_end: impl Fn() + 'static,
    ) -> Result<SlotBinding, LazyFormError> {
        if self.inner.bound.replace(true) {
            return Err(LazyFormError::SlotAlreadyBound {
                key: key.to_owned(),
            });
        }
        Ok(SlotBinding {
            slot: Rc::downgrade(&self.inner),
            _start: self.inner.set_start.subscribe(move |_| on_start()),
            _end: self.inner.set_end.subscribe(move |_| on_end()),
        })
    }
}

impl Default for ControlSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ControlSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlSlot")
            .field("control", &*self.inner.control.borrow())
            .field("bound", &self.inner.bound.get())
            .finish()
    }
}

/// A host's claim on a [`ControlSlot`]. Dropping it unsubscribes both
/// listeners and frees the slot for another host.
pub(crate) struct SlotBinding {
    slot: Weak<ControlSlotInner>,
    _start: Subscription,
    _end: Subscription,
}

impl Drop for SlotBinding {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.upgrade() {
            slot.bound.set(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn control() -> ControlRef {
        ControlRef::field(json!(null), Vec::new())
    }

    #[test]
    fn set_brackets_assignment_with_signals() {
        let slot = ControlSlot::new();
        let seen: Rc<RefCell<Vec<(&'static str, Option<ControlRef>)>>> =
            Rc::new(RefCell::new(Vec::new()));
        let old = control();
        let new = control();
        slot.set(old.clone());

        let binding = {
            let start_slot = slot.clone();
            let end_slot = slot.clone();
            let start_seen = seen.clone();
            let end_seen = seen.clone();
            slot.bind(
                "name",
                move || start_seen.borrow_mut().push(("start", start_slot.get())),
                move || end_seen.borrow_mut().push(("end", end_slot.get())),
            )
            .expect("first bind succeeds")
        };

        slot.set(new.clone());

        assert_eq!(
            seen.borrow().as_slice(),
            &[("start", Some(old)), ("end", Some(new))]
        );
        drop(binding);
    }

    #[test]
    fn slot_accepts_one_host_at_a_time() {
        let slot = ControlSlot::new();
        let binding = slot.bind("name", || {}, || {}).expect("first bind");

        let second = slot.bind("name", || {}, || {});
        assert!(matches!(
            second,
            Err(LazyFormError::SlotAlreadyBound { ref key }) if key == "name"
        ));

        drop(binding);
        assert!(!slot.is_bound());
        assert!(slot.bind("name", || {}, || {}).is_ok());
    }

    #[test]
    fn dropped_binding_stops_listening() {
        let slot = ControlSlot::new();
        let hits = Rc::new(Cell::new(0));
        let binding = {
            let hits = hits.clone();
            slot.bind("name", move || hits.set(hits.get() + 1), || {})
                .expect("bind")
        };
        slot.set(control());
        drop(binding);
        slot.set(control());

        assert_eq!(hits.get(), 1);
        assert_eq!(slot.control_set_start().subscriber_count(), 0);
    }
}
