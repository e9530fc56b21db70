//! Hook definitions and their target types.

use core::fmt;
use std::sync::Arc;

use hookwire_interceptor::CallContext;
use hookwire_reflect::{LoaderId, NO_OP_TYPE};

use crate::error::HookError;
use crate::method::DeclaredMethod;

// ─────────────────────────────────────────────────────────────────────────────
// TargetSpec
// ─────────────────────────────────────────────────────────────────────────────

/// Names the type a hook definition binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    name: String,
    loader: Option<LoaderId>,
}

impl TargetSpec {
    /// Targets the type `name`, resolved through the resolver's default
    /// loader.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            loader: None,
        }
    }

    /// Targets the no-op sentinel type: binding is skipped.
    #[must_use]
    pub fn no_op() -> Self {
        Self::new(NO_OP_TYPE)
    }

    /// Resolves the target, and every override type, starting from `loader`.
    #[must_use]
    pub fn with_loader(mut self, loader: impl Into<LoaderId>) -> Self {
        self.loader = Some(loader.into());
        self
    }

    /// Returns the target type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the loader hint.
    #[must_use]
    pub fn loader(&self) -> Option<&LoaderId> {
        self.loader.as_ref()
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.loader {
            Some(loader) => write!(f, "{}@{}", self.name, loader),
            None => f.write_str(&self.name),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookDefinition
// ─────────────────────────────────────────────────────────────────────────────

/// A bundle of hook methods targeting one type.
///
/// Usually implemented with `#[hooks]`. Hand-written implementations list
/// their methods through [`DeclaredMethod`].
pub trait HookDefinition: Send + Sync + 'static {
    /// Returns a name identifying the definition in diagnostics.
    fn name(&self) -> String {
        core::any::type_name::<Self>().to_string()
    }

    /// Returns the type the definition binds to.
    fn target(&self) -> TargetSpec;

    /// Returns the definition's own methods. Invokers may keep `self` alive.
    fn declared_methods(self: Arc<Self>) -> Vec<DeclaredMethod>;

    /// Returns the dispatcher hooked onto every otherwise unbound method of
    /// the target, if the definition wants one.
    fn all_methods(self: Arc<Self>) -> Option<Arc<dyn AllMethodsHook>> {
        None
    }

    /// Returns the dispatcher hooked onto every otherwise unbound constructor
    /// of the target, if the definition wants one.
    fn all_constructors(self: Arc<Self>) -> Option<Arc<dyn AllConstructorsHook>> {
        None
    }
}

/// Catch-all dispatch for methods.
pub trait AllMethodsHook: Send + Sync {
    /// Runs before every otherwise unbound method.
    fn before_all_methods(&self, ctx: &mut CallContext) -> Result<(), HookError>;

    /// Runs after every otherwise unbound method that has a receiver.
    fn after_all_methods(&self, ctx: &mut CallContext) -> Result<(), HookError>;
}

/// Catch-all dispatch for constructors.
pub trait AllConstructorsHook: Send + Sync {
    /// Runs before every otherwise unbound constructor.
    fn before_all_constructors(&self, ctx: &mut CallContext) -> Result<(), HookError>;

    /// Runs after every otherwise unbound constructor that produced an
    /// instance.
    fn after_all_constructors(&self, ctx: &mut CallContext) -> Result<(), HookError>;
}
