use std::fmt;

use crate::control::ControlKind;

#[derive(Debug)]
pub enum LazyFormError {
    /// The control handed to `initialize` is neither a group nor an array.
    UnsupportedContainerKind { kind: ControlKind },
    /// `add_control`/`remove_control` reached a coordinator with no adapter.
    NotInitialized,
    /// A widget slot is already driven by another host.
    SlotAlreadyBound { key: String },
    Serialization(serde_json::Error),
}

impl fmt::Display for LazyFormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LazyFormError::UnsupportedContainerKind { kind } => {
                write!(f, "unsupported container kind {kind:?}; expected a group or an array")
            }
            LazyFormError::NotInitialized => {
                write!(f, "coordinator used before initialize")
            }
            LazyFormError::SlotAlreadyBound { key } => {
                write!(f, "control slot for `{key}` is already bound to a host")
            }
            LazyFormError::Serialization(err) => write!(f, "model serialization failed: {err}"),
        }
    }
}

impl std::error::Error for LazyFormError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LazyFormError::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LazyFormError {
    fn from(err: serde_json::Error) -> Self {
        LazyFormError::Serialization(err)
    }
}
