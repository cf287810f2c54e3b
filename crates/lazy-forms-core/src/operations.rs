use crate::control::{ControlRef, NamedContainer, OrderedContainer};
use crate::LazyFormError;

/// Add/remove contract shared by both composite containers.
pub trait ControlOperations {
    fn add_control(&self, key: &str, control: ControlRef);

    /// Returns whether anything was removed. Removing an absent control is a
    /// no-op.
    fn remove_control(&self, key: &str, control: &ControlRef) -> bool;
}

impl ControlOperations for NamedContainer {
    /// Overwrites silently; callers keep keys unique.
    fn add_control(&self, key: &str, control: ControlRef) {
        self.insert(key, control);
    }

    fn remove_control(&self, key: &str, _control: &ControlRef) -> bool {
        self.remove(key).is_some()
    }
}

impl ControlOperations for OrderedContainer {
    fn add_control(&self, _key: &str, control: ControlRef) {
        self.push(control);
    }

    fn remove_control(&self, _key: &str, control: &ControlRef) -> bool {
        match self.position_of(control) {
            Some(index) => self.remove_at(index).is_some(),
            None => false,
        }
    }
}

/// Adapter over whichever composite container a form is bound to.
#[derive(Clone)]
pub enum CompositeAdapter {
    Named(NamedContainer),
    Ordered(OrderedContainer),
}

impl CompositeAdapter {
    pub fn new(container: &ControlRef) -> Result<Self, LazyFormError> {
        if let Some(named) = container.as_named() {
            return Ok(CompositeAdapter::Named(named));
        }
        if let Some(ordered) = container.as_ordered() {
            return Ok(CompositeAdapter::Ordered(ordered));
        }
        Err(LazyFormError::UnsupportedContainerKind {
            kind: container.kind(),
        })
    }

    pub fn container(&self) -> &ControlRef {
        match self {
            CompositeAdapter::Named(named) => named.control(),
            CompositeAdapter::Ordered(ordered) => ordered.control(),
        }
    }

    fn operations(&self) -> &dyn ControlOperations {
        match self {
            CompositeAdapter::Named(named) => named,
            CompositeAdapter::Ordered(ordered) => ordered,
        }
    }
}

impl ControlOperations for CompositeAdapter {
    fn add_control(&self, key: &str, control: ControlRef) {
        self.operations().add_control(key, control);
    }

    fn remove_control(&self, key: &str, control: &ControlRef) -> bool {
        self.operations().remove_control(key, control)
    }
}

#[cfg(test)]
#[path = "tests/operations_tests.rs"]
mod tests;
