//! Error types for the EventBus core
//!
//! `ErrorKind` is the closed set of validation outcomes reported by every bus
//! operation. `EventBusError` carries one non-`None` kind together with the
//! context that ends up in the warning log line.

use core::fmt;

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Error Kind
// ----------------------------------------------------------------------------

/// High-level validation and operation outcomes used for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorKind {
    #[default]
    None,
    NotOnOwningThread,
    InvalidChannel,
    ChannelNotRegistered,
    InvalidObject,
    InvalidBindingName,
    DelegateMemberNotFound,
    ListenerMethodNotBindable,
    SignatureMismatch,
    OwnershipPolicyConflict,
}

impl ErrorKind {
    /// Stable diagnostic string for this kind
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::None => "None",
            ErrorKind::NotOnOwningThread => "NotOnOwningThread",
            ErrorKind::InvalidChannel => "InvalidChannel",
            ErrorKind::ChannelNotRegistered => "ChannelNotRegistered",
            ErrorKind::InvalidObject => "InvalidObject",
            ErrorKind::InvalidBindingName => "InvalidBindingName",
            ErrorKind::DelegateMemberNotFound => "DelegateMemberNotFound",
            ErrorKind::ListenerMethodNotBindable => "ListenerMethodNotBindable",
            ErrorKind::SignatureMismatch => "SignatureMismatch",
            ErrorKind::OwnershipPolicyConflict => "OwnershipPolicyConflict",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ----------------------------------------------------------------------------
// Bus Error
// ----------------------------------------------------------------------------

/// Errors returned by the fallible (`try_*`) bus operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventBusError {
    #[error("{operation} must be called on the owning thread")]
    NotOnOwningThread { operation: &'static str },

    #[error("Invalid channel tag: '{tag}'")]
    InvalidChannel { tag: String },

    #[error("Channel not registered: {tag}")]
    ChannelNotRegistered { tag: String },

    #[error("Invalid object: {object}")]
    InvalidObject { object: String },

    #[error("Invalid binding name: '{name}'")]
    InvalidBindingName { name: String },

    #[error("Signal '{signal}' not found on class {class}")]
    DelegateMemberNotFound { class: String, signal: String },

    #[error("Method '{method}' on class {class} is not bindable")]
    ListenerMethodNotBindable { class: String, method: String },

    #[error("Signature mismatch: expected {expected}, got {actual} ({context})")]
    SignatureMismatch {
        expected: String,
        actual: String,
        context: String,
    },

    #[error("Ownership policy conflict on {tag}: registered owns={existing}, requested owns={requested}")]
    OwnershipPolicyConflict {
        tag: String,
        existing: bool,
        requested: bool,
    },
}

impl EventBusError {
    /// Maps this error back onto the closed diagnostic taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            EventBusError::NotOnOwningThread { .. } => ErrorKind::NotOnOwningThread,
            EventBusError::InvalidChannel { .. } => ErrorKind::InvalidChannel,
            EventBusError::ChannelNotRegistered { .. } => ErrorKind::ChannelNotRegistered,
            EventBusError::InvalidObject { .. } => ErrorKind::InvalidObject,
            EventBusError::InvalidBindingName { .. } => ErrorKind::InvalidBindingName,
            EventBusError::DelegateMemberNotFound { .. } => ErrorKind::DelegateMemberNotFound,
            EventBusError::ListenerMethodNotBindable { .. } => ErrorKind::ListenerMethodNotBindable,
            EventBusError::SignatureMismatch { .. } => ErrorKind::SignatureMismatch,
            EventBusError::OwnershipPolicyConflict { .. } => ErrorKind::OwnershipPolicyConflict,
        }
    }

    /// Create a signature mismatch error with context
    pub fn signature_mismatch<C: Into<String>>(
        expected: &crate::signal::Signature,
        actual: &crate::signal::Signature,
        context: C,
    ) -> Self {
        EventBusError::SignatureMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
            context: context.into(),
        }
    }

    /// Create a channel-not-registered error
    pub fn channel_not_registered(tag: &crate::types::ChannelTag) -> Self {
        EventBusError::ChannelNotRegistered {
            tag: tag.to_string(),
        }
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type EventBusResult<T> = core::result::Result<T, EventBusError>;
