use std::sync::Arc;

use lazy_forms_core::{
    ControlRef, ControlSlot, LazyWidget, Metadata, OnLazySetup, WidgetContext, WidgetType,
};
use serde_json::Value;

pub const SELECT: WidgetType = WidgetType::new("select", Select::boxed);

/// Single choice out of the metadata's `collection` option.
#[derive(Default)]
pub struct Select {
    slot: ControlSlot,
    value: Value,
    metadata: Option<Arc<Metadata>>,
}

impl Select {
    fn boxed() -> Box<dyn LazyWidget> {
        Box::<Self>::default()
    }

    pub fn choices(&self) -> &[Value] {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.option("collection"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the current value is one of the choices. Empty values count
    /// as "nothing selected yet".
    pub fn has_valid_selection(&self) -> bool {
        let Some(control) = self.slot.get() else {
            return false;
        };
        match control.value() {
            Value::Null => true,
            Value::String(text) if text.is_empty() => true,
            value => self.choices().contains(&value),
        }
    }
}

impl LazyWidget for Select {
    fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    fn set_metadata(&mut self, metadata: Arc<Metadata>) {
        self.metadata = Some(metadata);
    }

    fn control(&self) -> &ControlSlot {
        &self.slot
    }

    fn lazy_setup(&mut self) -> Option<&mut dyn OnLazySetup> {
        Some(self)
    }
}

impl OnLazySetup for Select {
    fn on_lazy_setup(&mut self, _cx: &WidgetContext) {
        let validators = self
            .metadata
            .as_ref()
            .map(|metadata| metadata.validators())
            .unwrap_or_default();
        self.slot
            .set(ControlRef::field(self.value.clone(), validators));
    }
}
