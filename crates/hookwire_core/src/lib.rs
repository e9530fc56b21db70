//! Core infrastructure for hookwire.
//!
//! This crate provides the ambient services the binding engine leans on:
//!
//! - [`diagnostics`] - Process-wide reporting of non-fatal binding problems
//! - [`TracingConfig`] - Structured logging via the `tracing` crate
//!
//! # Example
//!
//! ```
//! use hookwire_core::{TracingConfig, TracingFormat};
//! use hookwire_core::diagnostics::{self, Diagnostic, DiagnosticKind};
//! use tracing::Level;
//!
//! TracingConfig::new()
//!     .with_level(Level::WARN)
//!     .with_format(TracingFormat::Compact)
//!     .init();
//!
//! // Without an installed sink this becomes a `tracing` warning.
//! diagnostics::report(Diagnostic::new(
//!     DiagnosticKind::Resolution,
//!     "com.example.Hooks",
//!     "type com.example.Missing not found",
//! ));
//! ```
//!
//! # Architecture
//!
//! - **Layer 1** (`hookwire_reflect`, `hookwire_core`): Type metadata and infrastructure
//! - **Layer 2** (`hookwire_interceptor`): Low-level member interception
//! - **Layer 3** (`hookwire_binding`): Annotation-driven hook binding

pub mod diagnostics;
mod tracing_config;

pub use diagnostics::{CapturingSink, Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
pub use tracing_config::{TracingConfig, TracingFormat};
