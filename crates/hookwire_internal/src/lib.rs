//! # Hookwire Internal Library
//!
//! Re-exports the core hookwire crates for convenience.

/// Type metadata, descriptors and per-loader type resolution.
pub use hookwire_reflect;

/// Diagnostics and tracing setup.
pub use hookwire_core;

/// Per-member hook installation and call dispatch.
pub use hookwire_interceptor;

/// Hook definitions, candidate scanning and binding.
pub use hookwire_binding;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use hookwire_binding::{
        AllConstructorsHook, AllMethodsHook, BindError, Binding, BindingState, CallContext,
        HookDefinition, HookEngine, HookError, HookParam, HookSet, Intent, IntoHookResult,
        TargetSpec, Value, hooks,
    };
    pub use hookwire_core::{
        Diagnostic, DiagnosticKind, DiagnosticSink, TracingConfig, TracingFormat,
    };
    pub use hookwire_interceptor::{InterceptorRegistry, MethodInterceptor};
    pub use hookwire_reflect::{ClassPath, LoaderId, Member, MemberKind, TypeInfo, TypeResolver};
}
