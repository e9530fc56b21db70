//! Hook installation and dispatch.
//!
//! [`MethodInterceptor`] is the seam the binding engine installs hooks
//! through. [`InterceptorRegistry`] is the in-memory implementation: it keeps
//! the installed hooks per member and runs them around an original
//! implementation supplied by the caller of [`InterceptorRegistry::invoke`].
//!
//! # Dispatch Order
//!
//! 1. Before hooks, in installation order.
//! 2. If no before hook set a result: the most recently installed replace
//!    hook, or the original implementation when there is none.
//! 3. For constructors, a non-null result becomes the receiver.
//! 4. After hooks, in installation order.
//!
//! One-shot hooks are removed as soon as the dispatch that fired them ends,
//! including when a callback unwinds.
//!
//! Hooks are kept per defining loader and signature: two loaders defining a
//! type under the same name never share hooks.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use hookwire_reflect::{LoaderId, Member};
use parking_lot::RwLock;
use serde_json::Value;

use crate::context::CallContext;
use crate::error::InterceptError;
use crate::hook::{HookCallback, HookHandle, MemberHook, Timing};

// ─────────────────────────────────────────────────────────────────────────────
// MethodInterceptor
// ─────────────────────────────────────────────────────────────────────────────

/// Installs and removes runtime redirection of members.
pub trait MethodInterceptor: Send + Sync {
    /// Installs `hook` on `member`.
    ///
    /// # Errors
    ///
    /// Returns an [`InterceptError`] if the member cannot be hooked.
    fn install(&self, member: &Member, hook: MemberHook) -> Result<HookHandle, InterceptError>;

    /// Removes an installed hook. Returns `false` if it was already gone.
    ///
    /// A dispatch already running the hook is not interrupted.
    fn uninstall(&self, handle: &HookHandle) -> bool;
}

// ─────────────────────────────────────────────────────────────────────────────
// HookEntry
// ─────────────────────────────────────────────────────────────────────────────

struct HookEntry {
    id: u64,
    timing: Timing,
    callback: HookCallback,
    once: bool,
    fired: AtomicBool,
}

impl HookEntry {
    /// Returns whether this dispatch may run the hook. A one-shot hook can be
    /// claimed exactly once, even by concurrent dispatches.
    fn claim(&self) -> bool {
        !self.once || !self.fired.swap(true, Ordering::AcqRel)
    }
}

/// Defining loader and signature of a hooked member.
type HookKey = (Option<LoaderId>, String);

fn key_of(member: &Member) -> HookKey {
    (member.loader().cloned(), member.signature())
}

/// One-shot hooks fired by a dispatch, removed when it ends.
struct FiredHooks<'a> {
    registry: &'a InterceptorRegistry,
    key: &'a HookKey,
    ids: Vec<u64>,
}

impl Drop for FiredHooks<'_> {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            self.registry.remove(self.key, id);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InterceptorRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory [`MethodInterceptor`].
///
/// # Thread Safety
///
/// Installation and removal take a write lock; dispatch works on a snapshot
/// of the member's hooks taken under a read lock, so hooks may install or
/// remove hooks (including themselves) while running.
///
/// # Example
///
/// ```
/// use hookwire_interceptor::{InterceptorRegistry, MemberHook, MethodInterceptor};
/// use hookwire_reflect::TypeInfo;
/// use serde_json::json;
///
/// let greeter = TypeInfo::builder("com.example.Greeter")
///     .method("greet", &["java.lang.String"], "java.lang.String")
///     .build()
///     .unwrap();
/// let greet = &greeter.members()[0];
///
/// let registry = InterceptorRegistry::new();
/// registry
///     .install(greet, MemberHook::after(|ctx| ctx.set_result(json!("hi from hook"))))
///     .unwrap();
///
/// let ctx = registry.invoke(greet, None, Some(vec![json!("ada")]), |_this, args| {
///     json!(format!("hello {}", args[0].as_str().unwrap_or_default()))
/// });
/// assert_eq!(ctx.result(), Some(&json!("hi from hook")));
/// ```
pub struct InterceptorRegistry {
    /// Maps each hooked member to its hooks in installation order.
    hooks: RwLock<HashMap<HookKey, Vec<Arc<HookEntry>>>>,
    next_id: AtomicU64,
}

impl Default for InterceptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("hooked_members", &self.hooks.read().len())
            .field("hooks", &self.len())
            .finish()
    }
}

impl InterceptorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Calls `member` with every installed hook applied and returns the
    /// final call state.
    ///
    /// `original` receives the receiver and the arguments (empty when `args`
    /// is `None`) and produces the unhooked result.
    pub fn invoke(
        &self,
        member: &Member,
        this: Option<Value>,
        args: Option<Vec<Value>>,
        original: impl FnOnce(Option<&Value>, &[Value]) -> Value,
    ) -> CallContext {
        let key = key_of(member);
        let entries: Vec<Arc<HookEntry>> = self
            .hooks
            .read()
            .get(&key)
            .cloned()
            .unwrap_or_default();

        tracing::trace!(member = %key.1, hooks = entries.len(), "dispatching call");

        let mut ctx = CallContext::new(Arc::new(member.clone()), this, args);
        let mut fired = FiredHooks {
            registry: self,
            key: &key,
            ids: Vec::new(),
        };

        for entry in entries.iter().filter(|e| e.timing == Timing::Before) {
            if entry.claim() {
                run(entry, &mut ctx, &mut fired.ids);
            }
        }

        if !ctx.has_result() {
            let replacement = entries
                .iter()
                .rev()
                .filter(|e| e.timing == Timing::Replace)
                .find(|e| e.claim());
            let result = match replacement {
                Some(entry) => run(entry, &mut ctx, &mut fired.ids).unwrap_or(Value::Null),
                None => original(ctx.this(), ctx.args().unwrap_or_default()),
            };
            ctx.set_result(result);
        }

        if member.is_constructor()
            && let Some(instance) = ctx.result().filter(|value| !value.is_null())
        {
            let instance = instance.clone();
            ctx.set_this(Some(instance));
        }

        for entry in entries.iter().filter(|e| e.timing == Timing::After) {
            if entry.claim() {
                run(entry, &mut ctx, &mut fired.ids);
            }
        }

        drop(fired);
        ctx
    }

    /// Returns the number of hooks installed on `member`.
    #[must_use]
    pub fn hook_count(&self, member: &Member) -> usize {
        self.hooks
            .read()
            .get(&key_of(member))
            .map_or(0, Vec::len)
    }

    /// Returns the number of hooks with the given timing installed on `member`.
    #[must_use]
    pub fn hook_count_of(&self, member: &Member, timing: Timing) -> usize {
        self.hooks.read().get(&key_of(member)).map_or(0, |entries| {
            entries.iter().filter(|e| e.timing == timing).count()
        })
    }

    /// Returns `true` if any hook is installed on `member`.
    #[must_use]
    pub fn is_hooked(&self, member: &Member) -> bool {
        self.hook_count(member) > 0
    }

    /// Returns `true` if the hook behind `handle` is still installed.
    #[must_use]
    pub fn contains_hook(&self, handle: &HookHandle) -> bool {
        self.hooks
            .read()
            .get(&handle_key(handle))
            .is_some_and(|entries| entries.iter().any(|e| e.id == handle.id()))
    }

    /// Returns the total number of installed hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.read().values().map(Vec::len).sum()
    }

    /// Returns `true` if no hook is installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every hook.
    pub fn clear(&self) {
        self.hooks.write().clear();
    }

    fn remove(&self, key: &HookKey, id: u64) -> bool {
        let mut hooks = self.hooks.write();
        let Some(entries) = hooks.get_mut(key) else {
            return false;
        };
        let Some(position) = entries.iter().position(|e| e.id == id) else {
            return false;
        };
        entries.remove(position);
        if entries.is_empty() {
            hooks.remove(key);
        }
        true
    }
}

fn handle_key(handle: &HookHandle) -> HookKey {
    (handle.loader().cloned(), handle.signature().to_string())
}

fn run(entry: &HookEntry, ctx: &mut CallContext, fired: &mut Vec<u64>) -> Option<Value> {
    if entry.once {
        fired.push(entry.id);
    }
    (entry.callback)(ctx)
}

impl MethodInterceptor for InterceptorRegistry {
    fn install(&self, member: &Member, hook: MemberHook) -> Result<HookHandle, InterceptError> {
        let (loader, signature) = key_of(member);
        if member.is_abstract() {
            return Err(InterceptError::AbstractMember(signature));
        }

        let (timing, callback, once) = hook.into_parts();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.hooks
            .write()
            .entry((loader.clone(), signature.clone()))
            .or_default()
            .push(Arc::new(HookEntry {
                id,
                timing,
                callback,
                once,
                fired: AtomicBool::new(false),
            }));

        let handle = HookHandle::new(id, loader, signature);
        tracing::debug!(hook = %handle, %timing, once, "hook installed");
        Ok(handle)
    }

    fn uninstall(&self, handle: &HookHandle) -> bool {
        let removed = self.remove(&handle_key(handle), handle.id());
        if removed {
            tracing::debug!(hook = %handle, "hook uninstalled");
        }
        removed
    }
}
