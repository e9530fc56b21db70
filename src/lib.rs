//! Annotation-driven method and constructor hooks over reflected type
//! metadata.
//!

pub use hookwire_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use hookwire_internal::prelude::*;
}
