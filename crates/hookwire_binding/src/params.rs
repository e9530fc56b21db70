//! Parameter-type resolution for hook methods.
//!
//! Turns a hook method's formal parameters and their annotations into the
//! list of [`TypeConstraint`]s its target members must satisfy. The leading
//! context parameter is not part of the result.
//!
//! # Annotation Shapes
//!
//! Annotation lists come either one per formal parameter, or compacted so
//! that only some parameters have a list. The compacted shape is detected
//! when there are fewer lists than parameters. Correspondence is then
//! rebuilt by walking the parameters in order and handing the next list to
//! each parameter declared as the top type, and to no other parameter.
//! [`ParamAnnotation::Placeholder`] exists to occupy such a slot.
//!
//! A parameter whose declared type cannot be resolved and that carries no
//! override is ambiguous: the hook method is reported as misconfigured and
//! produces no constraints at all.

use core::fmt;

use hookwire_core::diagnostics::{self, Diagnostic, DiagnosticKind};
use hookwire_reflect::descriptor::canonical_name;
use hookwire_reflect::{LoaderId, OBJECT, TypeRef, TypeResolver};

use crate::method::{DeclaredMethod, ParamAnnotation};

// ─────────────────────────────────────────────────────────────────────────────
// TypeConstraint
// ─────────────────────────────────────────────────────────────────────────────

/// What one formal parameter of a target member must look like.
#[derive(Debug, Clone)]
pub enum TypeConstraint {
    /// The member's parameter type must be assignable to this type.
    Exact(TypeRef),
    /// Any parameter type is accepted.
    Unconstrained,
}

impl TypeConstraint {
    /// Returns `true` for [`Unconstrained`](Self::Unconstrained).
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        matches!(self, Self::Unconstrained)
    }

    /// Returns the constrained type name, if any.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Exact(ty) => Some(ty.name()),
            Self::Unconstrained => None,
        }
    }

    /// Returns whether a member parameter of type `param_type` satisfies
    /// this constraint.
    pub fn accepts(
        &self,
        resolver: &dyn TypeResolver,
        param_type: &str,
        loader: Option<&LoaderId>,
    ) -> bool {
        match self {
            Self::Exact(ty) => resolver.is_assignable(ty.name(), param_type, loader),
            Self::Unconstrained => true,
        }
    }
}

impl PartialEq for TypeConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name()
    }
}

impl Eq for TypeConstraint {}

impl fmt::Display for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name().unwrap_or("*"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Returns one annotation list per formal parameter, undoing compaction.
#[must_use]
pub fn align_annotations(method: &DeclaredMethod) -> Vec<&[ParamAnnotation]> {
    let types = method.parameter_types();
    let annotations = method.parameter_annotations();

    if annotations.len() >= types.len() {
        return annotations
            .iter()
            .take(types.len())
            .map(Vec::as_slice)
            .collect();
    }

    let mut slots = annotations.iter();
    types
        .iter()
        .map(|ty| {
            if is_top_type(ty) {
                slots.next().map_or(&[][..], Vec::as_slice)
            } else {
                &[][..]
            }
        })
        .collect()
}

/// Resolves the constraints for every parameter after the context
/// parameter.
///
/// Overrides naming types that fail to resolve widen to
/// [`TypeConstraint::Unconstrained`] and are reported as resolution
/// diagnostics attributed to `source`. Returns `None`, after reporting a
/// configuration diagnostic, when a parameter without an override declares
/// a type that cannot be resolved.
pub fn resolve_param_types(
    method: &DeclaredMethod,
    resolver: &dyn TypeResolver,
    loader: Option<&LoaderId>,
    source: &str,
) -> Option<Vec<TypeConstraint>> {
    let aligned = align_annotations(method);

    method
        .parameter_types()
        .iter()
        .zip(aligned)
        .skip(1)
        .enumerate()
        .map(|(index, (declared, annotations))| {
            let explicit = annotations.iter().find_map(|annotation| match annotation {
                ParamAnnotation::Override(name) => Some(name.as_deref().map(str::trim)),
                ParamAnnotation::Placeholder => None,
            });

            match explicit {
                Some(None | Some("" | "null")) => Some(TypeConstraint::Unconstrained),
                Some(Some(name)) => Some(resolve_or_widen(
                    resolver, name, loader, source, method, index,
                )),
                None if is_top_type(declared) => Some(TypeConstraint::Unconstrained),
                None => match resolver.resolve(declared, loader) {
                    Ok(ty) => Some(TypeConstraint::Exact(ty)),
                    Err(err) => {
                        diagnostics::report(
                            Diagnostic::new(
                                DiagnosticKind::Configuration,
                                source,
                                format!("parameter {index} has no override and {err}"),
                            )
                            .with_subject(method.name()),
                        );
                        None
                    }
                },
            }
        })
        .collect()
}

/// Returns `true` for any spelling of the top type.
fn is_top_type(name: &str) -> bool {
    canonical_name(name).is_ok_and(|name| name == OBJECT)
}

fn resolve_or_widen(
    resolver: &dyn TypeResolver,
    name: &str,
    loader: Option<&LoaderId>,
    source: &str,
    method: &DeclaredMethod,
    index: usize,
) -> TypeConstraint {
    match resolver.resolve(name, loader) {
        Ok(ty) => TypeConstraint::Exact(ty),
        Err(err) => {
            diagnostics::report(
                Diagnostic::new(
                    DiagnosticKind::Resolution,
                    source,
                    format!("parameter {index} matches any type: {err}"),
                )
                .with_subject(method.name()),
            );
            TypeConstraint::Unconstrained
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::CONTEXT_TYPE;
    use hookwire_core::CapturingSink;
    use hookwire_reflect::ClassPath;
    use std::sync::Arc;

    fn method() -> DeclaredMethod {
        DeclaredMethod::new("hook", |_, _| Ok(None)).param(CONTEXT_TYPE)
    }

    fn names(constraints: &[TypeConstraint]) -> Vec<String> {
        constraints.iter().map(ToString::to_string).collect()
    }

    fn try_resolve(method: &DeclaredMethod) -> (Option<Vec<TypeConstraint>>, Arc<CapturingSink>) {
        let classpath = ClassPath::new();
        let sink = Arc::new(CapturingSink::new());
        let constraints =
            sink.capture(|| resolve_param_types(method, &classpath, None, "test.Hooks"));
        (constraints, sink)
    }

    fn resolve(method: &DeclaredMethod) -> (Vec<TypeConstraint>, Arc<CapturingSink>) {
        let (constraints, sink) = try_resolve(method);
        (constraints.expect("every parameter resolves"), sink)
    }

    #[test]
    fn context_only_yields_nothing() {
        let (constraints, sink) = resolve(&method());
        assert!(constraints.is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn declared_types_are_used_verbatim() {
        let method = method().param("int").param("java.lang.String");
        let (constraints, _) = resolve(&method);
        assert_eq!(names(&constraints), ["int", "java.lang.String"]);
    }

    #[test]
    fn top_type_without_override_is_unconstrained() {
        let (constraints, _) = resolve(&method().param(OBJECT));
        assert_eq!(constraints, [TypeConstraint::Unconstrained]);
    }

    #[test]
    fn descriptor_spellings_of_the_top_type_are_unconstrained() {
        for spelling in ["Ljava/lang/Object;", "java/lang/Object"] {
            let (constraints, sink) = resolve(&method().param(spelling));
            assert_eq!(constraints, [TypeConstraint::Unconstrained], "{spelling}");
            assert!(constraints[0].accepts(&ClassPath::new(), "int", None));
            assert!(sink.is_empty());
        }
    }

    #[test]
    fn unresolvable_declared_type_without_override_is_misconfigured() {
        let method = method().param("int").param("com.example.Missing");
        let (constraints, sink) = try_resolve(&method);

        assert!(constraints.is_none());
        let reported = sink.of_kind(DiagnosticKind::Configuration);
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].subject.as_deref(), Some("hook"));
        assert!(reported[0].message.contains("parameter 1"));
        assert!(reported[0].message.contains("com.example.Missing"));
        assert!(sink.of_kind(DiagnosticKind::Resolution).is_empty());
    }

    #[test]
    fn override_settles_an_unresolvable_declared_type() {
        let method = method()
            .annotated_param("com.example.Missing", vec![ParamAnnotation::named("long")]);
        let (constraints, sink) = resolve(&method);
        assert_eq!(names(&constraints), ["long"]);
        assert!(sink.is_empty());
    }

    #[test]
    fn named_override_replaces_declared_type() {
        let method = method().annotated_param(OBJECT, vec![ParamAnnotation::named("long")]);
        let (constraints, _) = resolve(&method);
        assert_eq!(names(&constraints), ["long"]);
    }

    #[test]
    fn empty_and_null_overrides_match_anything() {
        let method = method()
            .annotated_param("int", vec![ParamAnnotation::any()])
            .annotated_param("int", vec![ParamAnnotation::named("")])
            .annotated_param("int", vec![ParamAnnotation::named("null")]);
        let (constraints, _) = resolve(&method);
        assert!(constraints.iter().all(TypeConstraint::is_unconstrained));
    }

    #[test]
    fn unresolvable_override_widens_and_reports() {
        let method =
            method().annotated_param(OBJECT, vec![ParamAnnotation::named("com.example.Missing")]);
        let (constraints, sink) = resolve(&method);

        assert_eq!(constraints, [TypeConstraint::Unconstrained]);
        let reported = sink.of_kind(DiagnosticKind::Resolution);
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].subject.as_deref(), Some("hook"));
        assert!(reported[0].message.contains("com.example.Missing"));
    }

    #[test]
    fn compacted_annotations_skip_concrete_parameters() {
        // [ctx, int, Object] with a single list: only the Object slot takes it.
        let method = method()
            .param("int")
            .param(OBJECT)
            .annotations(vec![vec![ParamAnnotation::named("java.lang.String")]]);
        let (constraints, _) = resolve(&method);
        assert_eq!(names(&constraints), ["int", "java.lang.String"]);
    }

    #[test]
    fn compacted_annotations_reach_descriptor_spelled_top_types() {
        let method = method()
            .param("int")
            .param("java/lang/Object")
            .annotations(vec![vec![ParamAnnotation::named("java.lang.String")]]);
        let (constraints, _) = resolve(&method);
        assert_eq!(names(&constraints), ["int", "java.lang.String"]);
    }

    #[test]
    fn placeholder_keeps_later_overrides_in_place() {
        let method = method()
            .param(OBJECT)
            .param(OBJECT)
            .annotations(vec![
                vec![ParamAnnotation::Placeholder],
                vec![ParamAnnotation::named("int")],
            ]);
        let (constraints, _) = resolve(&method);
        assert_eq!(names(&constraints), ["*", "int"]);
    }

    #[test]
    fn without_placeholder_the_override_shifts_left() {
        let method = method()
            .param(OBJECT)
            .param(OBJECT)
            .annotations(vec![vec![ParamAnnotation::named("int")]]);
        let (constraints, _) = resolve(&method);
        assert_eq!(names(&constraints), ["int", "*"]);
    }

    #[test]
    fn exact_accepts_assignable_parameters() {
        let classpath = ClassPath::new();
        let char_sequence = classpath.resolve("java.lang.CharSequence", None).unwrap();
        let constraint = TypeConstraint::Exact(char_sequence);

        assert!(constraint.accepts(&classpath, "java.lang.String", None));
        assert!(!constraint.accepts(&classpath, "int", None));
        assert!(TypeConstraint::Unconstrained.accepts(&classpath, "int", None));
    }
}
