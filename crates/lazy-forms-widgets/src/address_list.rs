use std::sync::Arc;

use lazy_forms_core::{
    ControlRef, ControlSlot, LazyForm, LazyFormError, LazyWidget, Metadata, OnLazySetup,
    WidgetContext, WidgetType,
};
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::address::ADDRESS_GROUP;
use crate::models::Address;

pub const ADDRESS_LIST: WidgetType = WidgetType::new("address-list", AddressList::boxed);

static ITEM_METADATA: Lazy<Arc<Metadata>> =
    Lazy::new(|| Arc::new(Metadata::builder(ADDRESS_GROUP).build("address")));

/// Editable list of addresses. Each item is an [`AddressGroup`] host of a
/// nested form bound to the list's array control.
///
/// [`AddressGroup`]: crate::AddressGroup
#[derive(Default)]
pub struct AddressList {
    slot: ControlSlot,
    value: Value,
    metadata: Option<Arc<Metadata>>,
    form: Option<LazyForm>,
}

impl AddressList {
    fn boxed() -> Box<dyn LazyWidget> {
        Box::<Self>::default()
    }

    pub fn form(&self) -> Option<&LazyForm> {
        self.form.as_ref()
    }

    pub fn len(&self) -> usize {
        self.form.as_ref().map_or(0, |form| form.hosts().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends an empty address. The item attaches on the next tick.
    pub fn add_item(&mut self) -> Result<(), LazyFormError> {
        let form = self.form.as_mut().ok_or(LazyFormError::NotInitialized)?;
        form.form().mark_as_dirty();
        let value = serde_json::to_value(Address::default())?;
        form.insert_host(ITEM_METADATA.clone(), value)?;
        log::debug!("address list grew to {} item(s)", form.hosts().len());
        Ok(())
    }

    /// Removes the item at `index`. Returns `false` when out of range.
    pub fn remove_item(&mut self, index: usize) -> bool {
        let Some(form) = self.form.as_mut() else {
            return false;
        };
        form.form().mark_as_dirty();
        form.remove_host_at(index)
    }
}

impl LazyWidget for AddressList {
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

impl OnLazySetup for AddressList {
    fn on_lazy_setup(&mut self, cx: &WidgetContext) {
        let validators = self
            .metadata
            .as_ref()
            .map(|metadata| metadata.validators())
            .unwrap_or_default();
        let array = ControlRef::array(validators);
        self.slot.set(array.clone());

        self.form = None;
        let mut form = match LazyForm::new(cx.runtime().clone(), array) {
            Ok(form) => form,
            Err(err) => {
                cx.runtime().report_error(err);
                return;
            }
        };
        let items = self.value.as_array().cloned().unwrap_or_default();
        for item in items {
            if let Err(err) = form.insert_host(ITEM_METADATA.clone(), item) {
                cx.runtime().report_error(err);
            }
        }
        self.form = Some(form);
    }
}
