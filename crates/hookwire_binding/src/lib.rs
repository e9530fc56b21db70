//! Annotation-driven hook binding for hookwire.
//!
//! A hook definition is a type whose methods carry intent markers naming
//! the members of one target type they should run around. Binding it scans
//! those methods, matches each one against the target's members by name,
//! parameter types and return type, and installs a hook on every match
//! through a [`MethodInterceptor`](hookwire_interceptor::MethodInterceptor).
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use hookwire_binding::{hooks, CallContext, HookEngine, Value};
//! use hookwire_interceptor::InterceptorRegistry;
//! use hookwire_reflect::{ClassPath, LoaderId, TypeInfo, TypeResolver};
//!
//! struct Censor;
//!
//! #[hooks(target = "com.example.Chat")]
//! impl Censor {
//!     #[replace_method("post")]
//!     fn post(&self, _ctx: &mut CallContext, text: String) -> String {
//!         text.replace("darn", "****")
//!     }
//! }
//!
//! let classpath = Arc::new(ClassPath::new());
//! classpath
//!     .define(
//!         &LoaderId::boot(),
//!         TypeInfo::builder("com.example.Chat")
//!             .method("post", &["java.lang.String"], "java.lang.String")
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let interceptor = Arc::new(InterceptorRegistry::new());
//! let hooks = HookEngine::new(classpath.clone(), interceptor.clone()).bind(Arc::new(Censor));
//! assert!(hooks.is_ready());
//!
//! let chat = classpath.resolve("com.example.Chat", None).unwrap();
//! let post = chat.methods().next().unwrap();
//! let ctx = interceptor.invoke(post, None, Some(vec![Value::from("oh darn")]), |_, args| {
//!     args[0].clone()
//! });
//! assert_eq!(ctx.result(), Some(&Value::from("oh ****")));
//! ```
//!
//! # Architecture
//!
//! - [`scanner`] - turns declared methods into [`CandidateOperation`]s
//! - [`params`] - resolves each candidate's parameter constraints
//! - [`matcher`] - selects the target members a candidate binds to
//! - [`adapter`] - wraps hook methods into interceptor callbacks
//! - [`HookEngine`] - runs the passes and installs the result as a [`HookSet`]
//! - [`HookParam`] / [`IntoHookResult`] - typed hook method signatures

// Self-reference so `#[hooks]` output can use `hookwire_binding::` paths within this crate.
extern crate self as hookwire_binding;

pub mod adapter;
mod convert;
mod definition;
mod engine;
mod error;
pub mod matcher;
mod method;
pub mod params;
pub mod scanner;

pub use convert::{HookParam, IntoHookResult};
pub use definition::{AllConstructorsHook, AllMethodsHook, HookDefinition, TargetSpec};
pub use engine::{Binding, BindingState, HookEngine, HookPlan, HookSet, PlannedBinding};
pub use error::{BindError, HookError};
pub use matcher::MatchCriteria;
pub use method::{CONTEXT_TYPE, DeclaredMethod, HookInvoker, Intent, ParamAnnotation};
pub use params::TypeConstraint;
pub use scanner::{CandidateOperation, IdentityKey, ScanResult};

pub use hookwire_interceptor::{CallContext, Value};

// Re-export proc macros.
pub use hook_macros::hooks;
