use std::sync::Arc;

use lazy_forms_core::{
    ControlRef, ControlSlot, LazyForm, LazyModel, LazyWidget, Metadata, OnLazySetup,
    WidgetContext, WidgetType,
};
use serde_json::Value;

use crate::models::Address;

pub const ADDRESS_GROUP: WidgetType = WidgetType::new("address-group", AddressGroup::boxed);

/// Group of the four [`Address`] fields, rendered through a nested form.
#[derive(Default)]
pub struct AddressGroup {
    slot: ControlSlot,
    value: Value,
    metadata: Option<Arc<Metadata>>,
    form: Option<LazyForm>,
}

impl AddressGroup {
    fn boxed() -> Box<dyn LazyWidget> {
        Box::<Self>::default()
    }

    /// The nested form, once set up.
    pub fn form(&self) -> Option<&LazyForm> {
        self.form.as_ref()
    }
}

impl LazyWidget for AddressGroup {
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

impl OnLazySetup for AddressGroup {
    fn on_lazy_setup(&mut self, cx: &WidgetContext) {
        let validators = self
            .metadata
            .as_ref()
            .map(|metadata| metadata.validators())
            .unwrap_or_default();
        let group = ControlRef::group(validators);
        self.slot.set(group.clone());

        // The previous nested form detaches from the previous group.
        self.form = None;
        let mut form = match LazyForm::new(cx.runtime().clone(), group) {
            Ok(form) => form,
            Err(err) => {
                cx.runtime().report_error(err);
                return;
            }
        };
        for (field, metadata) in Address::metadata_table().iter() {
            let value = self.value.get(field).cloned().unwrap_or(Value::Null);
            if let Err(err) = form.insert_host(metadata.clone(), value) {
                cx.runtime().report_error(err);
            }
        }
        self.form = Some(form);
    }
}
