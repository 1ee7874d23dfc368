//! Error types for Keryx.
//!
//! [`KeryxError`] is the standard error type threaded through pipelines and
//! proxy chains. Every variant maps to a stable [`ErrorKind`] so callers can
//! branch on what went wrong (a deadline expiry is distinguishable from a
//! downstream failure) and a stable machine-readable code used as the
//! metrics status label.
//!
//! Propagation policy: the recovery stage is the only place a non-error
//! failure (panic) becomes an error; the validation stage is the only stage
//! that manufactures a new error. Everything else passes errors upward
//! verbatim.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias using [`KeryxError`].
pub type KeryxResult<T> = Result<T, KeryxError>;

/// Stable error kinds for classification and branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The call's effective deadline expired.
    DeadlineExceeded,
    /// The request failed structural validation.
    InvalidArgument,
    /// A recovered panic or otherwise unclassifiable failure.
    Unknown,
    /// The caller canceled the call.
    Canceled,
    /// An error returned unchanged from the terminal handler or a lower
    /// layer.
    Downstream,
}

impl ErrorKind {
    /// Returns the stable machine-readable code for this kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Unknown => "UNKNOWN",
            Self::Canceled => "CANCELED",
            Self::Downstream => "DOWNSTREAM",
        }
    }
}

/// Standard error type for Keryx pipelines and proxy chains.
///
/// # Example
///
/// ```
/// use keryx_core::{ErrorKind, KeryxError};
///
/// let err = KeryxError::invalid_argument("merchant-id is required");
/// assert_eq!(err.kind(), ErrorKind::InvalidArgument);
/// assert_eq!(err.code(), "INVALID_ARGUMENT");
/// ```
#[derive(Error, Debug)]
pub enum KeryxError {
    /// The call's effective deadline expired.
    #[error("deadline exceeded: {message}")]
    DeadlineExceeded {
        /// Human-readable error message.
        message: String,
    },

    /// The request failed structural validation.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable error message.
        message: String,
        /// Field-specific validation errors.
        #[source]
        field_errors: Option<FieldErrors>,
    },

    /// A recovered panic, carrying the panic value's string form.
    #[error("unknown: {message}")]
    Unknown {
        /// The panic payload rendered as a string.
        message: String,
    },

    /// The caller canceled the call.
    #[error("canceled: {message}")]
    Canceled {
        /// Human-readable error message.
        message: String,
    },

    /// An error from the terminal handler or a lower layer, optionally
    /// wrapped with the remote side's message for readability.
    #[error("downstream: {message}")]
    Downstream {
        /// Human-readable error message.
        message: String,
        /// The underlying error, when one is available.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl KeryxError {
    /// Creates a deadline-exceeded error.
    #[must_use]
    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::DeadlineExceeded {
            message: message.into(),
        }
    }

    /// Creates an invalid-argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            field_errors: None,
        }
    }

    /// Creates an invalid-argument error with field-specific errors.
    #[must_use]
    pub fn invalid_argument_with_fields(
        message: impl Into<String>,
        field_errors: FieldErrors,
    ) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Creates an unknown error from a recovered panic payload.
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Creates a canceled error.
    #[must_use]
    pub fn canceled(message: impl Into<String>) -> Self {
        Self::Canceled {
            message: message.into(),
        }
    }

    /// Creates a downstream error with a message only.
    #[must_use]
    pub fn downstream(message: impl Into<String>) -> Self {
        Self::Downstream {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps a lower-layer error as a downstream error, keeping its message
    /// visible.
    pub fn downstream_from(source: impl Into<anyhow::Error>) -> Self {
        let source = source.into();
        Self::Downstream {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::Unknown { .. } => ErrorKind::Unknown,
            Self::Canceled { .. } => ErrorKind::Canceled,
            Self::Downstream { .. } => ErrorKind::Downstream,
        }
    }

    /// Returns the stable machine-readable code, used as the status label
    /// on call metrics.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind().code()
    }
}

/// Field-specific validation errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Error)]
#[error("field validation errors")]
pub struct FieldErrors {
    /// Map of field path to list of error messages.
    pub fields: HashMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates a new empty `FieldErrors`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}
