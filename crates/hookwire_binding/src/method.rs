//! Hook method metadata.
//!
//! A [`DeclaredMethod`] is what a hook definition exposes about one of its
//! own methods: the formal parameter types, the per-parameter annotations,
//! the intent markers with their target names, the optional return-type
//! filter and the one-shot flag, plus a closure that calls the method.
//! `#[hooks]` generates these; they can also be built by hand.

use core::fmt;
use std::sync::Arc;

use hookwire_interceptor::{CallContext, Timing, Value};
use hookwire_reflect::MemberKind;

use crate::error::HookError;

/// Canonical name of the callback context type. The first formal parameter
/// of every hook method must have this type.
pub const CONTEXT_TYPE: &str = "hookwire.interceptor.CallContext";

// ─────────────────────────────────────────────────────────────────────────────
// Intent
// ─────────────────────────────────────────────────────────────────────────────

/// Timing and member kind a hook method binds with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Runs before matching methods.
    BeforeMethod,
    /// Runs after matching methods.
    AfterMethod,
    /// Replaces matching methods.
    ReplaceMethod,
    /// Runs before matching constructors.
    BeforeConstructor,
    /// Runs after matching constructors.
    AfterConstructor,
    /// Replaces matching constructors.
    ReplaceConstructor,
}

impl Intent {
    /// Every intent, in binding pass order.
    pub const ALL: [Intent; 6] = [
        Self::BeforeMethod,
        Self::AfterMethod,
        Self::ReplaceMethod,
        Self::BeforeConstructor,
        Self::AfterConstructor,
        Self::ReplaceConstructor,
    ];

    /// Returns the interceptor timing.
    #[must_use]
    pub fn timing(self) -> Timing {
        match self {
            Self::BeforeMethod | Self::BeforeConstructor => Timing::Before,
            Self::AfterMethod | Self::AfterConstructor => Timing::After,
            Self::ReplaceMethod | Self::ReplaceConstructor => Timing::Replace,
        }
    }

    /// Returns the kind of member this intent binds to.
    #[must_use]
    pub fn member_kind(self) -> MemberKind {
        match self {
            Self::BeforeMethod | Self::AfterMethod | Self::ReplaceMethod => MemberKind::Method,
            Self::BeforeConstructor | Self::AfterConstructor | Self::ReplaceConstructor => {
                MemberKind::Constructor
            }
        }
    }

    /// Returns `true` for the two replace intents.
    #[must_use]
    pub fn is_replace(self) -> bool {
        self.timing() == Timing::Replace
    }

    /// Returns the attribute name used for this intent.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeMethod => "before_method",
            Self::AfterMethod => "after_method",
            Self::ReplaceMethod => "replace_method",
            Self::BeforeConstructor => "before_constructor",
            Self::AfterConstructor => "after_constructor",
            Self::ReplaceConstructor => "replace_constructor",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ParamAnnotation
// ─────────────────────────────────────────────────────────────────────────────

/// An annotation on one formal parameter of a hook method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamAnnotation {
    /// Overrides the type the parameter matches.
    ///
    /// `None`, an empty name or `"null"` match any type. Any other name is
    /// resolved through the type resolver.
    Override(Option<String>),
    /// Carries no meaning beyond occupying an annotation slot.
    Placeholder,
}

impl ParamAnnotation {
    /// Creates a named override.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Override(Some(name.into()))
    }

    /// Creates an override that matches any type.
    #[must_use]
    pub fn any() -> Self {
        Self::Override(None)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DeclaredMethod
// ─────────────────────────────────────────────────────────────────────────────

/// Calls a hook method with the context and the intercepted call's
/// arguments. The returned value, if any, is the replacement result.
pub type HookInvoker =
    Arc<dyn Fn(&mut CallContext, &[Value]) -> Result<Option<Value>, HookError> + Send + Sync>;

/// One method of a hook definition, with its annotations.
///
/// Parameters are listed in full, context parameter included. Each
/// [`param`](Self::param) call adds one annotation list, so the annotations
/// stay aligned with the parameters; [`annotations`](Self::annotations)
/// replaces them wholesale and may carry only the annotated parameters.
///
/// # Example
///
/// ```
/// use hookwire_binding::{CONTEXT_TYPE, DeclaredMethod, Intent};
///
/// let method = DeclaredMethod::new("log_greeting", |ctx, _args| {
///     tracing::info!(member = %ctx.member(), "greeting");
///     Ok(None)
/// })
/// .param(CONTEXT_TYPE)
/// .param("java.lang.String")
/// .intent(Intent::BeforeMethod, ["greet"]);
///
/// assert_eq!(method.parameter_types().len(), 2);
/// assert_eq!(method.intents()[0].1, ["greet"]);
/// ```
#[derive(Clone)]
pub struct DeclaredMethod {
    name: String,
    parameter_types: Vec<String>,
    parameter_annotations: Vec<Vec<ParamAnnotation>>,
    intents: Vec<(Intent, Vec<String>)>,
    return_type: Option<String>,
    one_shot: bool,
    invoker: HookInvoker,
}

impl DeclaredMethod {
    /// Starts describing the method `name`, called through `invoker`.
    pub fn new(
        name: impl Into<String>,
        invoker: impl Fn(&mut CallContext, &[Value]) -> Result<Option<Value>, HookError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_types: Vec::new(),
            parameter_annotations: Vec::new(),
            intents: Vec::new(),
            return_type: None,
            one_shot: false,
            invoker: Arc::new(invoker),
        }
    }

    /// Appends an unannotated formal parameter.
    #[must_use]
    pub fn param(self, type_name: impl Into<String>) -> Self {
        self.annotated_param(type_name, Vec::new())
    }

    /// Appends a formal parameter carrying `annotations`.
    #[must_use]
    pub fn annotated_param(
        mut self,
        type_name: impl Into<String>,
        annotations: Vec<ParamAnnotation>,
    ) -> Self {
        self.parameter_types.push(type_name.into());
        self.parameter_annotations.push(annotations);
        self
    }

    /// Replaces the annotation lists, e.g. with the compacted shape that
    /// holds entries for annotated parameters only.
    #[must_use]
    pub fn annotations(mut self, annotations: Vec<Vec<ParamAnnotation>>) -> Self {
        self.parameter_annotations = annotations;
        self
    }

    /// Adds an intent marker naming the target members.
    #[must_use]
    pub fn intent<I, S>(mut self, intent: Intent, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intents
            .push((intent, names.into_iter().map(Into::into).collect()));
        self
    }

    /// Sets the return-type filter.
    #[must_use]
    pub fn return_type(mut self, type_name: impl Into<String>) -> Self {
        self.return_type = Some(type_name.into());
        self
    }

    /// Marks the method's bindings as one-shot.
    #[must_use]
    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns every formal parameter type, context parameter included.
    #[must_use]
    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    /// Returns the raw annotation lists.
    #[must_use]
    pub fn parameter_annotations(&self) -> &[Vec<ParamAnnotation>] {
        &self.parameter_annotations
    }

    /// Returns the intent markers with their target names.
    #[must_use]
    pub fn intents(&self) -> &[(Intent, Vec<String>)] {
        &self.intents
    }

    /// Returns the return-type filter.
    #[must_use]
    pub fn return_filter(&self) -> Option<&str> {
        self.return_type.as_deref()
    }

    /// Returns `true` if bindings of this method are one-shot.
    #[must_use]
    pub fn is_one_shot(&self) -> bool {
        self.one_shot
    }

    /// Returns the invoker.
    #[must_use]
    pub fn invoker(&self) -> &HookInvoker {
        &self.invoker
    }
}

impl fmt::Debug for DeclaredMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclaredMethod")
            .field("name", &self.name)
            .field("parameter_types", &self.parameter_types)
            .field("parameter_annotations", &self.parameter_annotations)
            .field("intents", &self.intents)
            .field("return_type", &self.return_type)
            .field("one_shot", &self.one_shot)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_order_is_fixed() {
        assert_eq!(
            Intent::ALL.map(Intent::as_str),
            [
                "before_method",
                "after_method",
                "replace_method",
                "before_constructor",
                "after_constructor",
                "replace_constructor",
            ]
        );
    }

    #[test]
    fn intents_map_to_timing_and_kind() {
        assert_eq!(Intent::AfterConstructor.timing(), Timing::After);
        assert_eq!(Intent::AfterConstructor.member_kind(), MemberKind::Constructor);
        assert!(Intent::ReplaceMethod.is_replace());
        assert!(!Intent::BeforeMethod.is_replace());
    }

    #[test]
    fn params_keep_annotations_aligned() {
        let method = DeclaredMethod::new("m", |_, _| Ok(None))
            .param(CONTEXT_TYPE)
            .annotated_param("java.lang.Object", vec![ParamAnnotation::Placeholder])
            .annotated_param("java.lang.Object", vec![ParamAnnotation::named("int")]);

        assert_eq!(method.parameter_types().len(), 3);
        assert_eq!(
            method.parameter_annotations(),
            [
                vec![],
                vec![ParamAnnotation::Placeholder],
                vec![ParamAnnotation::named("int")],
            ]
        );
    }

    #[test]
    fn annotations_can_be_compacted() {
        let method = DeclaredMethod::new("m", |_, _| Ok(None))
            .param(CONTEXT_TYPE)
            .param("java.lang.Object")
            .annotations(vec![vec![ParamAnnotation::any()]]);

        assert_eq!(method.parameter_annotations().len(), 1);
        assert!(!method.is_one_shot());
        assert!(method.return_filter().is_none());
    }
}
