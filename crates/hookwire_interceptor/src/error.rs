//! Interception errors.

use thiserror::Error;

/// Errors returned when installing a hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterceptError {
    /// The member has no body to redirect.
    #[error("cannot hook abstract member {0}")]
    AbstractMember(String),
}
