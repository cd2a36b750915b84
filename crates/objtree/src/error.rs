//! Error types for inspection, enumeration and tree bookkeeping

use thiserror::Error;

use crate::inspect::Shape;
use crate::tree::NodeId;

/// An error raised by the inspected value itself.
///
/// These come from user data (a property getter that fails, a container that
/// refuses iteration) and are always recovered locally by the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectError {
    /// The value has no attribute with this name
    #[error("no attribute named {0:?}")]
    NoSuchAttribute(String),

    /// Accessing the value raised an error
    #[error("{0}")]
    Raised(String),

    /// The value does not support the requested operation
    #[error("{operation} is not supported by {type_name}")]
    Unsupported {
        operation: &'static str,
        type_name: String,
    },
}

impl InspectError {
    /// Shorthand for an error raised by the inspected value
    pub fn raised(message: impl Into<String>) -> Self {
        InspectError::Raised(message.into())
    }
}

/// A container-level failure while enumerating the children of a value.
///
/// Individual attribute failures never produce this error; they are skipped
/// and reported alongside the successful children.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to enumerate {shape} items of {path:?}: {source}")]
pub struct EnumerationError {
    /// Path of the value whose children were being enumerated
    pub path: String,
    /// Which protocol failed
    pub shape: Shape,
    /// The underlying error
    #[source]
    pub source: InspectError,
}

/// Errors reported by the tree itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The id does not refer to a live node
    #[error("invalid node id {0}")]
    InvalidNode(NodeId),

    /// A pre- or post-condition of the refresh algorithm was violated
    #[error("structural invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T, E = TreeError> = std::result::Result<T, E>;
