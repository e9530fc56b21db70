//! Hook callbacks and the handles that identify installed hooks.

use core::fmt;
use std::sync::Arc;

use hookwire_reflect::LoaderId;
use serde_json::Value;

use crate::context::CallContext;

// ─────────────────────────────────────────────────────────────────────────────
// Timing
// ─────────────────────────────────────────────────────────────────────────────

/// When a hook runs relative to the original implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timing {
    /// Runs before the original. May set a result to skip it.
    Before,
    /// Runs after the original (or its replacement).
    After,
    /// Runs instead of the original; its return value becomes the result.
    Replace,
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Replace => "replace",
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemberHook
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) type HookCallback = Arc<dyn Fn(&mut CallContext) -> Option<Value> + Send + Sync>;

/// A callback ready to be installed on a member.
///
/// # Example
///
/// ```
/// use hookwire_interceptor::{MemberHook, Timing};
/// use serde_json::json;
///
/// let hook = MemberHook::replace(|_ctx| json!("replaced")).once();
/// assert_eq!(hook.timing(), Timing::Replace);
/// assert!(hook.is_once());
/// ```
#[derive(Clone)]
pub struct MemberHook {
    timing: Timing,
    callback: HookCallback,
    once: bool,
}

impl MemberHook {
    /// Creates a hook that runs before the original.
    pub fn before(f: impl Fn(&mut CallContext) + Send + Sync + 'static) -> Self {
        Self::observing(Timing::Before, f)
    }

    /// Creates a hook that runs after the original.
    pub fn after(f: impl Fn(&mut CallContext) + Send + Sync + 'static) -> Self {
        Self::observing(Timing::After, f)
    }

    /// Creates a hook whose return value replaces the original call.
    pub fn replace(f: impl Fn(&mut CallContext) -> Value + Send + Sync + 'static) -> Self {
        Self {
            timing: Timing::Replace,
            callback: Arc::new(move |ctx| Some(f(ctx))),
            once: false,
        }
    }

    fn observing(timing: Timing, f: impl Fn(&mut CallContext) + Send + Sync + 'static) -> Self {
        Self {
            timing,
            callback: Arc::new(move |ctx| {
                f(ctx);
                None
            }),
            once: false,
        }
    }

    /// Marks the hook for removal right after its first dispatch.
    #[must_use]
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Returns when the hook runs.
    #[must_use]
    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Returns `true` if the hook removes itself after one dispatch.
    #[must_use]
    pub fn is_once(&self) -> bool {
        self.once
    }

    pub(crate) fn into_parts(self) -> (Timing, HookCallback, bool) {
        (self.timing, self.callback, self.once)
    }
}

impl fmt::Debug for MemberHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberHook")
            .field("timing", &self.timing)
            .field("once", &self.once)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookHandle
// ─────────────────────────────────────────────────────────────────────────────

/// Identifies one installed hook. Returned by
/// [`MethodInterceptor::install`](crate::MethodInterceptor::install).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookHandle {
    id: u64,
    loader: Option<LoaderId>,
    signature: Arc<str>,
}

impl HookHandle {
    /// Creates a handle. Interceptor implementations allocate the ids.
    #[must_use]
    pub fn new(id: u64, loader: Option<LoaderId>, signature: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            loader,
            signature: signature.into(),
        }
    }

    /// Returns the interceptor-assigned id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the loader that defined the hooked member's type.
    #[must_use]
    pub fn loader(&self) -> Option<&LoaderId> {
        self.loader.as_ref()
    }

    /// Returns the signature of the hooked member.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

impl fmt::Display for HookHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.signature)?;
        match &self.loader {
            Some(loader) => write!(f, " in {loader}"),
            None => Ok(()),
        }
    }
}
