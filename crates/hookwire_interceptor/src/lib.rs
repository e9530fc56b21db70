//! Member interception for hookwire.
//!
//! The binding engine never redirects calls itself: it hands closures to a
//! [`MethodInterceptor`], which owns the installed hooks and runs them
//! around the original implementation of the hooked member.
//!
//! - [`MemberHook`] - a before, after or replace callback, optionally one-shot
//! - [`CallContext`] - receiver, arguments and result of one intercepted call
//! - [`HookHandle`] - identifies an installed hook for later removal
//! - [`InterceptorRegistry`] - in-memory interceptor with full dispatch
//!
//! Values crossing the interception boundary are [`serde_json::Value`]s.

mod context;
mod error;
mod hook;
mod registry;

pub use context::CallContext;
pub use error::InterceptError;
pub use hook::{HookHandle, MemberHook, Timing};
pub use registry::{InterceptorRegistry, MethodInterceptor};
pub use serde_json::Value;
