//! Metadata descriptors and per-model registration tables.
//!
//! A model type exposes one static [`MetadataTable`] through [`LazyModel`].
//! The table is filled once, in field order, and registration assigns each
//! descriptor its key:
//!
//! ```ignore
//! static HERO: Lazy<MetadataTable> = Lazy::new(|| {
//!     MetadataTable::builder()
//!         .register("name", Metadata::builder(TEXT_INPUT).label("Name").required(true))
//!         .build()
//! });
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::validators::{required, Validator};
use crate::widget::LazyWidget;

/// Reference to a concrete widget type.
#[derive(Clone, Copy)]
pub struct WidgetType {
    name: &'static str,
    factory: fn() -> Box<dyn LazyWidget>,
}

impl WidgetType {
    pub const fn new(name: &'static str, factory: fn() -> Box<dyn LazyWidget>) -> Self {
        Self { name, factory }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn create(&self) -> Box<dyn LazyWidget> {
        (self.factory)()
    }
}

impl PartialEq for WidgetType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for WidgetType {}

impl fmt::Debug for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WidgetType").field(&self.name).finish()
    }
}

#[derive(Clone, Debug)]
pub struct Metadata {
    key: String,
    widget: WidgetType,
    required: bool,
    label: Option<String>,
    options: Map<String, Value>,
}

impl Metadata {
    pub fn builder(widget: WidgetType) -> MetadataBuilder {
        MetadataBuilder {
            widget,
            required: false,
            label: None,
            options: Map::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn widget(&self) -> WidgetType {
        self.widget
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Widget-specific field. The engine never reads these.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn validators(&self) -> Vec<Validator> {
        let mut validators: Vec<Validator> = Vec::new();
        if self.required {
            validators.push(required);
        }
        validators
    }
}

pub struct MetadataBuilder {
    widget: WidgetType,
    required: bool,
    label: Option<String>,
    options: Map<String, Value>,
}

impl MetadataBuilder {
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    /// Finishes the descriptor under `key`. Registration tables call this
    /// with the field name; widgets building item metadata pick their own.
    pub fn build(self, key: impl Into<String>) -> Metadata {
        Metadata {
            key: key.into(),
            widget: self.widget,
            required: self.required,
            label: self.label,
            options: self.options,
        }
    }
}

/// Field name to metadata, in registration order.
#[derive(Clone, Debug, Default)]
pub struct MetadataTable {
    entries: IndexMap<String, Arc<Metadata>>,
}

impl MetadataTable {
    pub fn builder() -> MetadataTableBuilder {
        MetadataTableBuilder {
            table: MetadataTable::default(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Arc<Metadata>> {
        self.entries.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Metadata>)> {
        self.entries
            .iter()
            .map(|(field, metadata)| (field.as_str(), metadata))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct MetadataTableBuilder {
    table: MetadataTable,
}

impl MetadataTableBuilder {
    /// Registers `field`; a second registration of the same field replaces
    /// the first and keeps its position.
    pub fn register(mut self, field: &str, metadata: MetadataBuilder) -> Self {
        self.table
            .entries
            .insert(field.to_owned(), Arc::new(metadata.build(field)));
        self
    }

    pub fn build(self) -> MetadataTable {
        self.table
    }
}

/// A model type with a static metadata table.
pub trait LazyModel {
    fn metadata_table() -> &'static MetadataTable;

    fn metadata(field: &str) -> Option<Arc<Metadata>> {
        Self::metadata_table().get(field).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_node::ControlSlot;
    use once_cell::sync::Lazy;
    use serde_json::json;

    struct NullWidget {
        slot: ControlSlot,
    }

    impl LazyWidget for NullWidget {
        fn set_value(&mut self, _value: Value) {}
        fn set_metadata(&mut self, _metadata: Arc<Metadata>) {}
        fn control(&self) -> &ControlSlot {
            &self.slot
        }
    }

    fn null_widget() -> Box<dyn LazyWidget> {
        Box::new(NullWidget {
            slot: ControlSlot::new(),
        })
    }

    const NULL_WIDGET: WidgetType = WidgetType::new("null", null_widget);

    struct Villain;

    static VILLAIN: Lazy<MetadataTable> = Lazy::new(|| {
        MetadataTable::builder()
            .register("alias", Metadata::builder(NULL_WIDGET).required(true))
            .register(
                "lair",
                Metadata::builder(NULL_WIDGET)
                    .label("Lair")
                    .option("type", json!("text")),
            )
            .build()
    });

    impl LazyModel for Villain {
        fn metadata_table() -> &'static MetadataTable {
            &VILLAIN
        }
    }

    #[test]
    fn registration_assigns_keys_in_field_order() {
        let fields: Vec<&str> = Villain::metadata_table().iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec!["alias", "lair"]);

        let lair = Villain::metadata("lair").expect("lair registered");
        assert_eq!(lair.key(), "lair");
        assert_eq!(lair.label(), Some("Lair"));
        assert_eq!(lair.option("type"), Some(&json!("text")));
        assert_eq!(lair.widget(), NULL_WIDGET);
        assert!(Villain::metadata("hideout").is_none());
    }

    #[test]
    fn validators_follow_flags() {
        let alias = Villain::metadata("alias").expect("alias registered");
        let validators = alias.validators();
        assert_eq!(validators.len(), 1);
        assert!(validators[0](&json!("")).is_some());

        let lair = Villain::metadata("lair").expect("lair registered");
        assert!(lair.validators().is_empty());
    }
}
