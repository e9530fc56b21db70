//! Error types for descriptor parsing and type resolution.

use thiserror::Error;

use crate::resolver::LoaderId;

/// Errors produced while normalizing a type name or descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// The type name was empty.
    #[error("empty type name")]
    Empty,

    /// The descriptor could not be parsed.
    #[error("invalid type descriptor: {0}")]
    Invalid(String),
}

/// Errors produced by a [`TypeResolver`](crate::TypeResolver).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// No loader in the chain defines the requested type.
    #[error("type '{name}' not found via loader '{loader}'")]
    NotFound {
        /// Canonical name that was looked up.
        name: String,
        /// Loader the lookup started from.
        loader: LoaderId,
    },

    /// The loader hint does not name a registered loader.
    #[error("unknown class loader '{0}'")]
    UnknownLoader(LoaderId),

    /// The loader already defines a type with this name.
    #[error("type '{name}' is already defined by loader '{loader}'")]
    AlreadyDefined {
        /// Canonical name of the duplicate type.
        name: String,
        /// Loader that already owns it.
        loader: LoaderId,
    },

    /// The requested name is not a valid type name or descriptor.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

impl ResolutionError {
    /// Creates a [`NotFound`](Self::NotFound).
    pub fn not_found(name: impl Into<String>, loader: LoaderId) -> Self {
        Self::NotFound {
            name: name.into(),
            loader,
        }
    }
}
