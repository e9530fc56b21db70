//! Error types for hook methods and binding.

use hookwire_reflect::ResolutionError;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while running a hook method.
///
/// These never escape into the interceptor: the call adapter reports them
/// as user-callback diagnostics and the binding stays installed.
#[derive(Debug, Error)]
pub enum HookError {
    /// The intercepted call has fewer arguments than the hook method takes.
    #[error("missing argument {index}")]
    MissingArgument {
        /// Position of the missing argument.
        index: usize,
    },

    /// An argument could not be converted to the hook method's parameter type.
    #[error("argument {index}: expected {expected}, found {found}")]
    Argument {
        /// Position of the argument.
        index: usize,
        /// Canonical name of the expected type.
        expected: String,
        /// The value that was passed.
        found: Value,
    },

    /// The hook method itself failed.
    #[error("{0}")]
    Failed(String),

    /// JSON conversion of a return value failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HookError {
    /// Creates a [`Failed`](Self::Failed) error.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Creates an [`Argument`](Self::Argument) error.
    pub fn argument(index: usize, expected: impl Into<String>, found: &Value) -> Self {
        Self::Argument {
            index,
            expected: expected.into(),
            found: found.clone(),
        }
    }
}

/// Errors that end the binding of a whole hook definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The definition's target type could not be resolved.
    #[error("target type unavailable: {0}")]
    Target(#[from] ResolutionError),

    /// The definition panicked while describing itself.
    #[error("hook definition panicked: {0}")]
    Definition(String),
}
