use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::control::ControlRef;
use crate::coordinator::AttachmentCoordinator;
use crate::host::ControlHost;
use crate::metadata::{LazyModel, Metadata};
use crate::runtime::RuntimeHandle;
use crate::LazyFormError;

/// A composite container plus the hosts rendering its children.
///
/// Children attach on the next tick after they are rendered. Dropping the
/// form (or a host) posts the detach of the corresponding controls.
pub struct LazyForm {
    coordinator: AttachmentCoordinator,
    form: ControlRef,
    hosts: Vec<ControlHost>,
}

impl LazyForm {
    pub fn new(runtime: RuntimeHandle, form: ControlRef) -> Result<Self, LazyFormError> {
        let coordinator = AttachmentCoordinator::new(runtime);
        coordinator.initialize(&form)?;
        Ok(Self {
            coordinator,
            form,
            hosts: Vec::new(),
        })
    }

    /// Rebinds to `form` and resets every host. Returns `false` if `form` is
    /// the container already bound.
    pub fn set_form(&mut self, form: ControlRef) -> Result<bool, LazyFormError> {
        if form.ptr_eq(&self.form) {
            return Ok(false);
        }
        self.coordinator.initialize(&form)?;
        self.form = form;
        Ok(true)
    }

    pub fn reinitialize(&self) -> Result<(), LazyFormError> {
        self.coordinator.initialize(&self.form)
    }

    pub fn form(&self) -> &ControlRef {
        &self.form
    }

    pub fn coordinator(&self) -> &AttachmentCoordinator {
        &self.coordinator
    }

    pub fn insert_host(
        &mut self,
        metadata: Arc<Metadata>,
        value: Value,
    ) -> Result<&ControlHost, LazyFormError> {
        let host = ControlHost::new(&self.coordinator, metadata, value)?;
        self.hosts.push(host);
        let index = self.hosts.len() - 1;
        Ok(&self.hosts[index])
    }

    /// Renders one host per registered field of `M`, fed with that field of
    /// `model`.
    pub fn bind_model<M>(&mut self, model: &M) -> Result<(), LazyFormError>
    where
        M: LazyModel + Serialize,
    {
        let value = serde_json::to_value(model)?;
        for (field, metadata) in M::metadata_table().iter() {
            let field_value = value.get(field).cloned().unwrap_or(Value::Null);
            self.insert_host(metadata.clone(), field_value)?;
        }
        Ok(())
    }

    /// Tears down the first host rendered under `key`.
    pub fn remove_host(&mut self, key: &str) -> bool {
        match self.hosts.iter().position(|host| host.key() == key) {
            Some(index) => self.remove_host_at(index),
            None => false,
        }
    }

    pub fn remove_host_at(&mut self, index: usize) -> bool {
        if index >= self.hosts.len() {
            return false;
        }
        let host = self.hosts.remove(index);
        log::debug!("form drops host #{} for `{}`", host.id(), host.key());
        drop(host);
        true
    }

    pub fn host(&self, key: &str) -> Option<&ControlHost> {
        self.hosts.iter().find(|host| host.key() == key)
    }

    pub fn hosts(&self) -> &[ControlHost] {
        &self.hosts
    }

    pub fn value(&self) -> Value {
        self.form.value()
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
