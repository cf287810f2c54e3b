#![doc = r"Control lifecycle engine for lazily rendered form widgets."]

pub mod control;
pub mod coordinator;
pub mod error;
pub mod form;
pub mod host;
pub mod metadata;
pub mod operations;
pub mod platform;
pub mod runtime;
pub mod signals;
pub mod validators;
pub mod value_node;
pub mod widget;

pub use control::{ControlId, ControlKind, ControlRef, NamedContainer, OrderedContainer};
pub use coordinator::{AttachmentCoordinator, AttachmentEvent};
pub use error::LazyFormError;
pub use form::LazyForm;
pub use host::{ChildCreated, ControlHost, HostDiagnostic, HostId, HostState};
pub use metadata::{
    LazyModel, Metadata, MetadataBuilder, MetadataTable, MetadataTableBuilder, WidgetType,
};
pub use operations::{CompositeAdapter, ControlOperations};
pub use platform::RuntimeScheduler;
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle, Task};
pub use signals::{Subject, Subscription};
pub use validators::{ValidationError, Validator};
pub use value_node::ControlSlot;
pub use widget::{LazyWidget, OnLazySetup, WidgetContext};

#[cfg(test)]
pub use runtime::{TestRuntime, TestScheduler};
