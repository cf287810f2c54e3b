use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::metadata::Metadata;
use crate::runtime::RuntimeHandle;
use crate::value_node::ControlSlot;

/// What a host hands to a widget when it initializes or sets it up.
#[derive(Clone)]
pub struct WidgetContext {
    runtime: RuntimeHandle,
}

impl WidgetContext {
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self { runtime }
    }

    /// Runtime to use for nested forms rendered by the widget.
    pub fn runtime(&self) -> &RuntimeHandle {
        &self.runtime
    }
}

/// A pluggable input resolved at runtime from [`Metadata`].
///
/// The host assigns `value` and `metadata` before any setup step runs and
/// listens to the widget's [`ControlSlot`]. Widgets without the
/// [`OnLazySetup`] capability are expected to produce their control in
/// [`LazyWidget::on_init`]; producing it in the constructor still works but
/// is reported as a diagnostic.
pub trait LazyWidget: Any {
    fn set_value(&mut self, value: Value);

    fn set_metadata(&mut self, metadata: Arc<Metadata>);

    fn control(&self) -> &ControlSlot;

    /// Initialization phase, run once per instance after the inputs are set.
    /// Not called for widgets that expose [`OnLazySetup`].
    fn on_init(&mut self, _cx: &WidgetContext) {}

    /// The setup capability, if this widget has one.
    fn lazy_setup(&mut self) -> Option<&mut dyn OnLazySetup> {
        None
    }
}

impl dyn LazyWidget {
    pub fn as_any(&self) -> &dyn Any {
        self
    }

    pub fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Setup capability: (re)build the widget's control after its inputs are
/// set. Widgets implementing it are kept across resets and set up again
/// instead of being recreated.
pub trait OnLazySetup {
    fn on_lazy_setup(&mut self, cx: &WidgetContext);
}
