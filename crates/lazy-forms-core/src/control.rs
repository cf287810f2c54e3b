//! Bound value nodes ("controls") and the two composite containers.
//!
//! A [`ControlRef`] is a shared handle; clones point at the same control and
//! equality is identity. Composite controls are reached through the typed
//! views [`NamedContainer`] (groups) and [`OrderedContainer`] (arrays).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::validators::{ValidationError, Validator};

pub type ControlId = usize;

static NEXT_CONTROL_ID: AtomicUsize = AtomicUsize::new(1);

fn next_control_id() -> ControlId {
    NEXT_CONTROL_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Field,
    Group,
    Array,
}

type GroupEntries = Rc<RefCell<IndexMap<String, ControlRef>>>;
type ArrayEntries = Rc<RefCell<Vec<ControlRef>>>;

enum ControlNode {
    Field(RefCell<Value>),
    Group(GroupEntries),
    Array(ArrayEntries),
}

struct ControlInner {
    id: ControlId,
    node: ControlNode,
    validators: Vec<Validator>,
    dirty: Cell<bool>,
}

#[derive(Clone)]
pub struct ControlRef {
    inner: Rc<ControlInner>, // FUTURE(no_std): replace Rc with arena-managed control handles.
}

impl ControlRef {
    fn with_node(node: ControlNode, validators: Vec<Validator>) -> Self {
        Self {
            inner: Rc::new(ControlInner {
                id: next_control_id(),
                node,
                validators,
                dirty: Cell::new(false),
            }),
        }
    }

    pub fn field(value: Value, validators: Vec<Validator>) -> Self {
        Self::with_node(ControlNode::Field(RefCell::new(value)), validators)
    }

    pub fn group(validators: Vec<Validator>) -> Self {
        Self::with_node(
            ControlNode::Group(Rc::new(RefCell::new(IndexMap::new()))),
            validators,
        )
    }

    pub fn array(validators: Vec<Validator>) -> Self {
        Self::with_node(
            ControlNode::Array(Rc::new(RefCell::new(Vec::new()))),
            validators,
        )
    }

    pub fn id(&self) -> ControlId {
        self.inner.id
    }

    pub fn kind(&self) -> ControlKind {
        match &self.inner.node {
            ControlNode::Field(_) => ControlKind::Field,
            ControlNode::Group(_) => ControlKind::Group,
            ControlNode::Array(_) => ControlKind::Array,
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Current value. Groups produce an object of their children's values,
    /// arrays an array.
    pub fn value(&self) -> Value {
        match &self.inner.node {
            ControlNode::Field(value) => value.borrow().clone(),
            ControlNode::Group(entries) => {
                let object: Map<String, Value> = entries
                    .borrow()
                    .iter()
                    .map(|(key, control)| (key.clone(), control.value()))
                    .collect();
                Value::Object(object)
            }
            ControlNode::Array(entries) => {
                Value::Array(entries.borrow().iter().map(ControlRef::value).collect())
            }
        }
    }

    /// Writes `value` into this control. Composite controls forward matching
    /// object keys / array positions to their children and ignore the rest.
    pub fn set_value(&self, value: Value) {
        match &self.inner.node {
            ControlNode::Field(current) => *current.borrow_mut() = value,
            ControlNode::Group(entries) => {
                let Value::Object(fields) = value else {
                    return;
                };
                let children: Vec<(String, ControlRef)> = entries
                    .borrow()
                    .iter()
                    .map(|(key, control)| (key.clone(), control.clone()))
                    .collect();
                for (key, child) in children {
                    if let Some(field) = fields.get(&key) {
                        child.set_value(field.clone());
                    }
                }
            }
            ControlNode::Array(entries) => {
                let Value::Array(items) = value else {
                    return;
                };
                let children = entries.borrow().clone();
                for (child, item) in children.iter().zip(items) {
                    child.set_value(item);
                }
            }
        }
    }

    /// Errors raised by this control's own validators.
    pub fn errors(&self) -> Vec<ValidationError> {
        let value = self.value();
        self.inner
            .validators
            .iter()
            .filter_map(|validator| validator(&value))
            .collect()
    }

    /// True when this control and every descendant pass validation.
    pub fn is_valid(&self) -> bool {
        self.errors().is_empty() && self.children().iter().all(ControlRef::is_valid)
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    pub fn mark_as_dirty(&self) {
        self.inner.dirty.set(true);
    }

    pub fn mark_as_pristine(&self) {
        self.inner.dirty.set(false);
        for child in self.children() {
            child.mark_as_pristine();
        }
    }

    fn children(&self) -> Vec<ControlRef> {
        match &self.inner.node {
            ControlNode::Field(_) => Vec::new(),
            ControlNode::Group(entries) => entries.borrow().values().cloned().collect(),
            ControlNode::Array(entries) => entries.borrow().clone(),
        }
    }

    pub fn as_named(&self) -> Option<NamedContainer> {
        match &self.inner.node {
            ControlNode::Group(entries) => Some(NamedContainer {
                control: self.clone(),
                entries: entries.clone(),
            }),
            _ => None,
        }
    }

    pub fn as_ordered(&self) -> Option<OrderedContainer> {
        match &self.inner.node {
            ControlNode::Array(entries) => Some(OrderedContainer {
                control: self.clone(),
                entries: entries.clone(),
            }),
            _ => None,
        }
    }
}

impl PartialEq for ControlRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ControlRef {}

impl fmt::Debug for ControlRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlRef")
            .field("id", &self.inner.id)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Group view: string key to control, iterated in insertion order.
#[derive(Clone)]
pub struct NamedContainer {
    control: ControlRef,
    entries: GroupEntries,
}

impl NamedContainer {
    pub fn control(&self) -> &ControlRef {
        &self.control
    }

    /// Stores `control` under `key`, returning the control it replaced.
    pub fn insert(&self, key: impl Into<String>, control: ControlRef) -> Option<ControlRef> {
        self.entries.borrow_mut().insert(key.into(), control)
    }

    pub fn remove(&self, key: &str) -> Option<ControlRef> {
        self.entries.borrow_mut().shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<ControlRef> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Array view: a sequence of controls addressed by identity.
#[derive(Clone)]
pub struct OrderedContainer {
    control: ControlRef,
    entries: ArrayEntries,
}

impl OrderedContainer {
    pub fn control(&self) -> &ControlRef {
        &self.control
    }

    pub fn push(&self, control: ControlRef) {
        self.entries.borrow_mut().push(control);
    }

    pub fn remove_at(&self, index: usize) -> Option<ControlRef> {
        let mut entries = self.entries.borrow_mut();
        (index < entries.len()).then(|| entries.remove(index))
    }

    pub fn position_of(&self, control: &ControlRef) -> Option<usize> {
        self.entries
            .borrow()
            .iter()
            .position(|entry| entry.ptr_eq(control))
    }

    pub fn at(&self, index: usize) -> Option<ControlRef> {
        self.entries.borrow().get(index).cloned()
    }

    pub fn controls(&self) -> Vec<ControlRef> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::required;
    use serde_json::json;

    #[test]
    fn clones_share_identity() {
        let control = ControlRef::field(json!("Bombasto"), Vec::new());
        let alias = control.clone();
        let other = ControlRef::field(json!("Bombasto"), Vec::new());

        assert_eq!(control, alias);
        assert_ne!(control, other);
        assert_ne!(control.id(), other.id());
    }

    #[test]
    fn group_value_collects_children() {
        let group = ControlRef::group(Vec::new());
        let named = group.as_named().expect("group exposes a named view");
        named.insert("street", ControlRef::field(json!("123 Main"), Vec::new()));
        named.insert("city", ControlRef::field(json!("Anywhere"), Vec::new()));

        assert_eq!(group.value(), json!({ "street": "123 Main", "city": "Anywhere" }));
        assert_eq!(named.keys(), vec!["street".to_string(), "city".to_string()]);
        assert!(group.as_ordered().is_none());
    }

    #[test]
    fn set_value_reaches_nested_controls() {
        let array = ControlRef::array(Vec::new());
        let ordered = array.as_ordered().expect("array exposes an ordered view");
        let first = ControlRef::field(json!("a"), Vec::new());
        let second = ControlRef::field(json!("b"), Vec::new());
        ordered.push(first.clone());
        ordered.push(second.clone());

        array.set_value(json!(["x", "y", "ignored"]));

        assert_eq!(first.value(), json!("x"));
        assert_eq!(second.value(), json!("y"));
        assert_eq!(ordered.position_of(&second), Some(1));
    }

    #[test]
    fn validity_includes_descendants() {
        let group = ControlRef::group(Vec::new());
        let named = group.as_named().expect("named view");
        let name = ControlRef::field(json!(""), vec![required]);
        named.insert("name", name.clone());

        assert!(!group.is_valid());
        assert!(group.errors().is_empty());

        name.set_value(json!("Magneta"));
        assert!(group.is_valid());
    }

    #[test]
    fn pristine_resets_whole_tree() {
        let group = ControlRef::group(Vec::new());
        let child = ControlRef::field(json!(1), Vec::new());
        group.as_named().expect("named view").insert("power", child.clone());
        group.mark_as_dirty();
        child.mark_as_dirty();

        group.mark_as_pristine();

        assert!(!group.is_dirty());
        assert!(!child.is_dirty());
    }
}
