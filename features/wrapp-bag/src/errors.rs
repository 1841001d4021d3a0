use std::sync::Arc;

use thiserror::Error;

use crate::types::DynError;

/// Errors when trying to register a dependency
#[derive(Error, Debug, Clone)]
pub enum RegisterError {
    /// `each` needs something it can recompute, a constant can't be
    #[error("'{0}' is not injectable, only injectables can be registered with `each`")]
    NotInjectable(String),
    /// The name is taken and the bag rejects collisions
    #[error("The bag already contains a '{0}'")]
    AlreadyRegistered(String),
}

/// Errors of the test isolation helpers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StashError {
    #[error("The bag is not stashed")]
    NotStashed,
}

/// Errors while resolving dependencies
///
/// Must be Clone as one result can be shared by many consumers.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// Nothing is registered under the name
    #[error("No dependency named '{0}' is registered")]
    Missing(String),
    /// A provider returned an error
    #[error("Provider for '{name}' failed - error: {error}")]
    ProviderFailed { name: String, error: Arc<DynError> },

    #[error("Failed to downcast '{name}', required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        name: String,
        required_type: &'static str,
        actual_type: &'static str,
    },
    /// A lazy dependency was taken as a plain value
    #[error("'{0}' is lazy and has to be taken as `Lazy`")]
    Deferred(String),
    #[error("No dependency was declared at position {0}")]
    OutOfRange(usize),
    #[error("No dependency named '{0}' was declared")]
    Undeclared(String),
}
