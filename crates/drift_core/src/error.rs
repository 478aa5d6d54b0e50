//! Property error types

use thiserror::Error;

use crate::value::ValueKind;

/// Errors raised at the owner property boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    /// The value does not have the kind the receiver expects
    #[error("expected a {expected} value, found {found}")]
    WrongKind { expected: ValueKind, found: ValueKind },

    /// The widget owning the property no longer exists
    #[error("property owner has been dropped")]
    OwnerDropped,

    /// The owner refused the value
    #[error("property `{name}` rejected value: {reason}")]
    Rejected { name: String, reason: String },
}

/// Result type for property operations
pub type Result<T> = std::result::Result<T, PropertyError>;
