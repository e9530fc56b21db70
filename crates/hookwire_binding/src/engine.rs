//! The binding engine.
//!
//! Binding a [`HookDefinition`] happens in two phases:
//!
//! 1. [`HookEngine::plan`] resolves the target type, scans the declared
//!    methods and matches every candidate against the target's members. It
//!    reports diagnostics but installs nothing.
//! 2. [`HookEngine::activate`] turns each planned binding into an installed
//!    hook through the [`MethodInterceptor`].
//!
//! [`HookEngine::bind`] runs both and returns the resulting [`HookSet`].
//!
//! # Passes
//!
//! Candidates are planned one intent at a time, in [`Intent::ALL`] order.
//! A hook method that replaces members of a kind is left out of that kind's
//! before and after passes. Definitions with a catch-all capability get a
//! before/after pair on every remaining member afterwards.

use core::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use hashbrown::HashSet;
use hookwire_core::diagnostics::{self, Diagnostic, DiagnosticKind};
use hookwire_interceptor::{HookHandle, MemberHook, MethodInterceptor, Timing};
use hookwire_reflect::{Member, TypeRef, TypeResolver};

use crate::adapter::{self, panic_message};
use crate::definition::{AllConstructorsHook, AllMethodsHook, HookDefinition};
use crate::error::BindError;
use crate::matcher::{self, MatchCriteria};
use crate::method::Intent;
use crate::params::resolve_param_types;
use crate::scanner::{self, CandidateOperation};

// ─────────────────────────────────────────────────────────────────────────────
// BindingState
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of one hook definition.
///
/// `Uninitialized -> TargetResolved -> Scanned -> Bound -> Ready`, ending
/// early in `Skipped` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingState {
    /// Nothing has happened yet.
    Uninitialized,
    /// The target type was resolved.
    TargetResolved,
    /// The declared methods were scanned.
    Scanned,
    /// Every pass was planned.
    Bound,
    /// The planned bindings were handed to the interceptor.
    Ready,
    /// The target is the no-op type; nothing binds.
    Skipped,
    /// The definition could not be bound at all.
    Failed,
}

impl BindingState {
    /// Returns a stable lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::TargetResolved => "target_resolved",
            Self::Scanned => "scanned",
            Self::Bound => "bound",
            Self::Ready => "ready",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for BindingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookPlan
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
enum PlannedHook {
    Candidate {
        candidate: CandidateOperation,
        pass_args: bool,
    },
    AllMethods(Arc<dyn AllMethodsHook>),
    AllConstructors(Arc<dyn AllConstructorsHook>),
}

/// One member a definition will hook, and what it will run there.
#[derive(Clone)]
pub struct PlannedBinding {
    member: Member,
    hook: PlannedHook,
}

impl PlannedBinding {
    /// Returns the target member.
    #[must_use]
    pub fn member(&self) -> &Member {
        &self.member
    }

    /// Returns the hook method name, or `all_methods` / `all_constructors`
    /// for catch-all bindings.
    #[must_use]
    pub fn method(&self) -> &str {
        match &self.hook {
            PlannedHook::Candidate { candidate, .. } => candidate.name(),
            PlannedHook::AllMethods(_) => "all_methods",
            PlannedHook::AllConstructors(_) => "all_constructors",
        }
    }

    /// Returns the intent, or `None` for catch-all bindings.
    #[must_use]
    pub fn intent(&self) -> Option<Intent> {
        match &self.hook {
            PlannedHook::Candidate { candidate, .. } => Some(candidate.intent()),
            PlannedHook::AllMethods(_) | PlannedHook::AllConstructors(_) => None,
        }
    }

    /// Returns `true` for catch-all bindings.
    #[must_use]
    pub fn is_catch_all(&self) -> bool {
        self.intent().is_none()
    }
}

impl fmt::Debug for PlannedBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannedBinding")
            .field("member", &self.member.signature())
            .field("method", &self.method())
            .field("intent", &self.intent())
            .finish()
    }
}

/// The outcome of [`HookEngine::plan`].
#[derive(Clone)]
pub struct HookPlan {
    definition: Arc<dyn HookDefinition>,
    source: Arc<str>,
    target: Option<TypeRef>,
    state: BindingState,
    error: Option<BindError>,
    bindings: Vec<PlannedBinding>,
}

impl HookPlan {
    fn new(definition: Arc<dyn HookDefinition>) -> Self {
        let source = Arc::from(definition.name());
        Self {
            definition,
            source,
            target: None,
            state: BindingState::Uninitialized,
            error: None,
            bindings: Vec::new(),
        }
    }

    /// Returns the definition name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.source
    }

    /// Returns the resolved target type.
    #[must_use]
    pub fn target(&self) -> Option<&TypeRef> {
        self.target.as_ref()
    }

    /// Returns how far planning got.
    #[must_use]
    pub fn state(&self) -> BindingState {
        self.state
    }

    /// Returns the error that failed the definition.
    #[must_use]
    pub fn error(&self) -> Option<&BindError> {
        self.error.as_ref()
    }

    /// Returns the planned bindings, in pass order.
    #[must_use]
    pub fn bindings(&self) -> &[PlannedBinding] {
        &self.bindings
    }

    /// Returns the number of planned bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if nothing will be hooked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn fail(mut self, error: BindError) -> Self {
        let kind = match &error {
            BindError::Target(_) => DiagnosticKind::Resolution,
            BindError::Definition(_) => DiagnosticKind::Configuration,
        };
        diagnostics::report(Diagnostic::new(kind, &*self.source, error.to_string()));
        self.state = BindingState::Failed;
        self.error = Some(error);
        self
    }
}

impl fmt::Debug for HookPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookPlan")
            .field("name", &self.source)
            .field("target", &self.target.as_ref().map(|t| t.name()))
            .field("state", &self.state)
            .field("error", &self.error)
            .field("bindings", &self.bindings)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookSet
// ─────────────────────────────────────────────────────────────────────────────

/// One hook installed on one member.
#[derive(Debug, Clone)]
pub struct Binding {
    method: String,
    intent: Option<Intent>,
    timing: Timing,
    member: Member,
    one_shot: bool,
    handle: HookHandle,
}

impl Binding {
    /// Returns the hook method name. Catch-all bindings report the dispatch
    /// method, e.g. `before_all_methods`.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the intent, or `None` for catch-all bindings.
    #[must_use]
    pub fn intent(&self) -> Option<Intent> {
        self.intent
    }

    /// Returns when the hook runs.
    #[must_use]
    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Returns the hooked member.
    #[must_use]
    pub fn member(&self) -> &Member {
        &self.member
    }

    /// Returns `true` if the interceptor drops the hook after one dispatch.
    #[must_use]
    pub fn is_one_shot(&self) -> bool {
        self.one_shot
    }

    /// Returns the interceptor handle.
    #[must_use]
    pub fn handle(&self) -> &HookHandle {
        &self.handle
    }
}

/// The installed hooks of one definition.
///
/// Dropping a `HookSet` leaves its hooks installed; call
/// [`unhook_all`](Self::unhook_all) to remove them.
pub struct HookSet {
    name: Arc<str>,
    definition: Arc<dyn HookDefinition>,
    target: Option<TypeRef>,
    state: BindingState,
    error: Option<BindError>,
    bindings: Vec<Binding>,
    interceptor: Arc<dyn MethodInterceptor>,
}

impl HookSet {
    /// Returns the definition name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the definition.
    #[must_use]
    pub fn definition(&self) -> &Arc<dyn HookDefinition> {
        &self.definition
    }

    /// Returns the resolved target type.
    #[must_use]
    pub fn target(&self) -> Option<&TypeRef> {
        self.target.as_ref()
    }

    /// Returns the final state.
    #[must_use]
    pub fn state(&self) -> BindingState {
        self.state
    }

    /// Returns `true` once the definition reached [`BindingState::Ready`].
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == BindingState::Ready
    }

    /// Returns the error that failed the definition.
    #[must_use]
    pub fn error(&self) -> Option<&BindError> {
        self.error.as_ref()
    }

    /// Returns the installed bindings, in installation order.
    ///
    /// One-shot bindings stay listed after the interceptor has dropped them.
    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Returns the bindings created for hook method `method`.
    pub fn bindings_for<'a>(&'a self, method: &'a str) -> impl Iterator<Item = &'a Binding> {
        self.bindings.iter().filter(move |b| b.method == method)
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Removes one binding. Returns `false` if it does not belong to this
    /// set or the interceptor no longer had it.
    pub fn unhook(&mut self, binding: &Binding) -> bool {
        let Some(position) = self.bindings.iter().position(|b| b.handle == binding.handle) else {
            return false;
        };
        let binding = self.bindings.remove(position);
        self.interceptor.uninstall(&binding.handle)
    }

    /// Removes every binding and returns how many were still installed.
    pub fn unhook_all(&mut self) -> usize {
        let removed = self
            .bindings
            .drain(..)
            .filter(|binding| self.interceptor.uninstall(&binding.handle))
            .count();
        tracing::debug!(definition = %self.name, removed, "hook definition unhooked");
        removed
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("name", &self.name)
            .field("target", &self.target.as_ref().map(|t| t.name()))
            .field("state", &self.state)
            .field("error", &self.error)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookEngine
// ─────────────────────────────────────────────────────────────────────────────

/// Binds hook definitions to their targets.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use hookwire_binding::{
///     BindingState, CONTEXT_TYPE, DeclaredMethod, HookDefinition, HookEngine, Intent, TargetSpec,
/// };
/// use hookwire_interceptor::InterceptorRegistry;
/// use hookwire_reflect::{ClassPath, LoaderId, TypeInfo};
///
/// struct Greeting;
///
/// impl HookDefinition for Greeting {
///     fn target(&self) -> TargetSpec {
///         TargetSpec::new("com.example.Greeter")
///     }
///
///     fn declared_methods(self: Arc<Self>) -> Vec<DeclaredMethod> {
///         vec![
///             DeclaredMethod::new("shout", |ctx, _| Ok(ctx.take_result()))
///                 .param(CONTEXT_TYPE)
///                 .intent(Intent::AfterMethod, ["greet"]),
///         ]
///     }
/// }
///
/// let classpath = Arc::new(ClassPath::new());
/// classpath
///     .define(
///         &LoaderId::boot(),
///         TypeInfo::builder("com.example.Greeter")
///             .method("greet", &[], "java.lang.String")
///             .build()
///             .unwrap(),
///     )
///     .unwrap();
///
/// let interceptor = Arc::new(InterceptorRegistry::new());
/// let engine = HookEngine::new(classpath, interceptor.clone());
/// let hooks = engine.bind(Arc::new(Greeting));
///
/// assert_eq!(hooks.state(), BindingState::Ready);
/// assert_eq!(hooks.len(), 1);
/// assert_eq!(interceptor.len(), 1);
/// ```
#[derive(Clone)]
pub struct HookEngine {
    resolver: Arc<dyn TypeResolver>,
    interceptor: Arc<dyn MethodInterceptor>,
}

impl HookEngine {
    /// Creates an engine resolving types through `resolver` and installing
    /// hooks through `interceptor`.
    pub fn new(resolver: Arc<dyn TypeResolver>, interceptor: Arc<dyn MethodInterceptor>) -> Self {
        Self {
            resolver,
            interceptor,
        }
    }

    /// Returns the type resolver.
    #[must_use]
    pub fn resolver(&self) -> &Arc<dyn TypeResolver> {
        &self.resolver
    }

    /// Returns the interceptor.
    #[must_use]
    pub fn interceptor(&self) -> &Arc<dyn MethodInterceptor> {
        &self.interceptor
    }

    /// Plans and activates `definition`.
    pub fn bind(&self, definition: Arc<dyn HookDefinition>) -> HookSet {
        self.activate(self.plan(definition))
    }

    /// Works out every binding of `definition` without installing anything.
    ///
    /// Problems with single candidates are reported and skipped. The plan
    /// ends in [`BindingState::Failed`] only when the target type cannot be
    /// resolved or the definition itself panics.
    pub fn plan(&self, definition: Arc<dyn HookDefinition>) -> HookPlan {
        let mut plan = HookPlan::new(definition);
        let span = tracing::debug_span!("plan", definition = %plan.source);
        let _enter = span.enter();

        let spec = match guard(|| plan.definition.target()) {
            Ok(spec) => spec,
            Err(err) => return plan.fail(err),
        };
        let target = match self.resolver.resolve(spec.name(), spec.loader()) {
            Ok(target) => target,
            Err(err) => return plan.fail(BindError::Target(err)),
        };
        if target.is_no_op() {
            tracing::debug!(target_type = %spec, "no-op target, nothing to bind");
            plan.state = BindingState::Skipped;
            return plan;
        }
        tracing::debug!(target_type = %spec, "target resolved");
        plan.target = Some(Arc::clone(&target));
        plan.state = BindingState::TargetResolved;

        let methods = match guard(|| Arc::clone(&plan.definition).declared_methods()) {
            Ok(methods) => methods,
            Err(err) => return plan.fail(err),
        };
        let scan = scanner::scan(&plan.source, methods);
        plan.state = BindingState::Scanned;

        let loader = spec.loader();
        let mut bound: HashSet<String> = HashSet::new();

        for intent in Intent::ALL {
            let kind = intent.member_kind();
            let replaced = scan.replaced_names(kind);
            let before = plan.bindings.len();

            for candidate in scan.candidates(intent) {
                if !intent.is_replace() && replaced.contains(candidate.name()) {
                    tracing::debug!(
                        method = candidate.name(),
                        %intent,
                        "skipped in favor of its replacement"
                    );
                    continue;
                }

                let Some(params) =
                    resolve_param_types(candidate.method(), &*self.resolver, loader, &plan.source)
                else {
                    continue;
                };
                let pass_args = !params.is_empty();
                let criteria = MatchCriteria::for_candidate(candidate, params);
                let matched =
                    matcher::filter(&criteria, target.members(), kind, &*self.resolver, loader);

                if matched.is_empty() {
                    matcher::report_no_match(&plan.source, candidate, target.name(), &criteria);
                    continue;
                }
                for member in matched {
                    bound.insert(member.signature());
                    plan.bindings.push(PlannedBinding {
                        member,
                        hook: PlannedHook::Candidate {
                            candidate: candidate.clone(),
                            pass_args,
                        },
                    });
                }
            }

            tracing::debug!(%intent, bindings = plan.bindings.len() - before, "pass planned");
        }

        let all_methods = match guard(|| Arc::clone(&plan.definition).all_methods()) {
            Ok(hook) => hook,
            Err(err) => return plan.fail(err),
        };
        let all_constructors = match guard(|| Arc::clone(&plan.definition).all_constructors()) {
            Ok(hook) => hook,
            Err(err) => return plan.fail(err),
        };

        if let Some(hook) = all_methods {
            let unbound = target
                .methods()
                .filter(|m| !m.is_abstract() && !bound.contains(&m.signature()));
            for member in unbound {
                plan.bindings.push(PlannedBinding {
                    member: member.clone(),
                    hook: PlannedHook::AllMethods(Arc::clone(&hook)),
                });
            }
        }
        if let Some(hook) = all_constructors {
            let unbound = target
                .constructors()
                .filter(|m| !bound.contains(&m.signature()));
            for member in unbound {
                plan.bindings.push(PlannedBinding {
                    member: member.clone(),
                    hook: PlannedHook::AllConstructors(Arc::clone(&hook)),
                });
            }
        }

        plan.state = BindingState::Bound;
        plan
    }

    /// Installs the bindings of a [`BindingState::Bound`] plan. Plans in any
    /// other state produce an empty [`HookSet`] carrying that state.
    ///
    /// A member the interceptor refuses is reported as an install
    /// diagnostic; the rest still bind.
    pub fn activate(&self, plan: HookPlan) -> HookSet {
        let HookPlan {
            definition,
            source,
            target,
            state,
            error,
            bindings: planned,
        } = plan;

        let mut set = HookSet {
            name: Arc::clone(&source),
            definition,
            target,
            state,
            error,
            bindings: Vec::new(),
            interceptor: Arc::clone(&self.interceptor),
        };
        if state != BindingState::Bound {
            return set;
        }

        let span = tracing::debug_span!("activate", definition = %source);
        let _enter = span.enter();

        for PlannedBinding { member, hook } in planned {
            match hook {
                PlannedHook::Candidate {
                    candidate,
                    pass_args,
                } => {
                    let hook = adapter::candidate_hook(Arc::clone(&source), &candidate, pass_args);
                    set.bindings.extend(self.install(
                        &source,
                        &member,
                        hook,
                        candidate.name(),
                        Some(candidate.intent()),
                    ));
                }
                PlannedHook::AllMethods(dispatcher) => {
                    let (before, after) = adapter::all_methods_hooks(Arc::clone(&source), dispatcher);
                    set.bindings
                        .extend(self.install(&source, &member, before, "before_all_methods", None));
                    set.bindings
                        .extend(self.install(&source, &member, after, "after_all_methods", None));
                }
                PlannedHook::AllConstructors(dispatcher) => {
                    let (before, after) =
                        adapter::all_constructors_hooks(Arc::clone(&source), dispatcher);
                    set.bindings.extend(self.install(
                        &source,
                        &member,
                        before,
                        "before_all_constructors",
                        None,
                    ));
                    set.bindings.extend(self.install(
                        &source,
                        &member,
                        after,
                        "after_all_constructors",
                        None,
                    ));
                }
            }
        }

        set.state = BindingState::Ready;
        tracing::info!(
            definition = %source,
            target_type = set.target.as_ref().map(|t| t.name()).unwrap_or_default(),
            bindings = set.bindings.len(),
            "hook definition ready"
        );
        set
    }

    fn install(
        &self,
        source: &str,
        member: &Member,
        hook: MemberHook,
        method: &str,
        intent: Option<Intent>,
    ) -> Option<Binding> {
        let timing = hook.timing();
        let one_shot = hook.is_once();
        match self.interceptor.install(member, hook) {
            Ok(handle) => Some(Binding {
                method: method.to_string(),
                intent,
                timing,
                member: member.clone(),
                one_shot,
                handle,
            }),
            Err(err) => {
                diagnostics::report(
                    Diagnostic::new(
                        DiagnosticKind::Install,
                        source,
                        format!("{}: {err}", member.signature()),
                    )
                    .with_subject(method),
                );
                None
            }
        }
    }
}

impl fmt::Debug for HookEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookEngine").finish_non_exhaustive()
    }
}

/// Runs a call into user definition code, turning a panic into
/// [`BindError::Definition`].
fn guard<T>(f: impl FnOnce() -> T) -> Result<T, BindError> {
    catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| BindError::Definition(panic_message(&*payload)))
}
