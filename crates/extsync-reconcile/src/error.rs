//! Reconciliation error types.

use std::fmt;

use extsync_core::CoreError;
use extsync_registry::RegistryError;
use thiserror::Error;

/// Errors raised by a [`Resolver`](crate::Resolver).
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The prompt could not be shown or answered.
    #[error("Prompt failed: {0}")]
    Prompt(String),
}

impl ResolverError {
    pub fn prompt(message: impl Into<String>) -> Self {
        Self::Prompt(message.into())
    }
}

/// The remote mutation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOperation {
    Create,
    Migrate,
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Migrate => write!(f, "migrate"),
        }
    }
}

/// Errors that end a reconciliation run.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A required confirmation was declined. Nothing was mutated.
    #[error("Reconciliation aborted")]
    AbortSilent,

    /// A create or migrate call failed. Earlier mutations stay in place.
    #[error("Remote {operation} failed for '{handle}': {source}")]
    RemoteCall {
        operation: RemoteOperation,
        handle: String,
        #[source]
        source: RegistryError,
    },

    #[error("Failed to list registrations: {0}")]
    Listing(#[source] RegistryError),

    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// A phase produced a result that breaks the partition rules.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ReconcileError {
    pub fn remote_call(
        operation: RemoteOperation,
        handle: impl Into<String>,
        source: RegistryError,
    ) -> Self {
        Self::RemoteCall {
            operation,
            handle: handle.into(),
            source,
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// The run was declined by the user and needs no further message.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::AbortSilent)
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AbortSilent => ErrorCategory::Aborted,
            Self::RemoteCall { .. } | Self::Listing(_) => ErrorCategory::Remote,
            Self::Resolver(_) => ErrorCategory::Interaction,
            Self::InvariantViolation(_) => ErrorCategory::Internal,
            Self::Core(_) => ErrorCategory::Validation,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Aborted,
    Remote,
    Interaction,
    Internal,
    Validation,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted => write!(f, "aborted"),
            Self::Remote => write!(f, "remote"),
            Self::Interaction => write!(f, "interaction"),
            Self::Internal => write!(f, "internal"),
            Self::Validation => write!(f, "validation"),
        }
    }
}
