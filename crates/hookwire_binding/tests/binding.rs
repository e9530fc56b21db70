//! End-to-end binding of hand-assembled hook definitions.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use common::{Fixture, Journal, Manual, TARGET, UNRELATED};
use hookwire_binding::{
    BindError, BindingState, CONTEXT_TYPE, DeclaredMethod, HookError, Intent, ParamAnnotation,
    TargetSpec, Value,
};
use hookwire_core::DiagnosticKind;
use hookwire_interceptor::Timing;
use hookwire_reflect::OBJECT;
use serde_json::json;

fn signatures(hooks: &hookwire_binding::HookSet) -> Vec<String> {
    hooks
        .bindings()
        .iter()
        .map(|b| b.member().signature())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Matching scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn name_filter_binds_every_overload() {
    let fx = Fixture::new();
    let journal = Journal::default();
    let hooks = fx.bind(Manual::new(vec![
        journal.hook("foo").intent(Intent::BeforeMethod, ["bar"]),
    ]));

    assert_eq!(hooks.state(), BindingState::Ready);
    assert_eq!(
        signatures(&hooks),
        [
            "com.example.Target#bar(int)",
            "com.example.Target#bar(java.lang.String)"
        ]
    );

    let ctx = fx.call("bar(int)", None, vec![json!(1)]);
    assert_eq!(ctx.result(), Some(&json!("original")));
    fx.call("bar(java.lang.String)", None, vec![json!("x")]);

    // Without resolved parameters the hook method sees no arguments.
    assert_eq!(journal.entries(), ["foo[]", "foo[]"]);
    assert!(fx.sink.is_empty());
}

#[test]
fn unconstrained_slot_accepts_any_single_parameter() {
    let fx = Fixture::new();
    let journal = Journal::default();
    let hooks = fx.bind(Manual::new(vec![
        journal
            .hook("foo")
            .param(OBJECT)
            .intent(Intent::BeforeMethod, ["bar"]),
    ]));

    assert_eq!(hooks.len(), 2);

    fx.call("bar(int)", None, vec![json!(1)]);
    fx.call("bar(java.lang.String)", None, vec![json!("x")]);
    assert_eq!(journal.entries(), ["foo[1]", "foo[\"x\"]"]);
}

#[test]
fn resolvable_type_that_nothing_takes_matches_nothing() {
    let fx = Fixture::new();
    let journal = Journal::default();
    let hooks = fx.bind(Manual::new(vec![
        journal
            .hook("foo")
            .param(UNRELATED)
            .intent(Intent::BeforeMethod, ["bar"]),
    ]));

    assert_eq!(hooks.state(), BindingState::Ready);
    assert!(hooks.is_empty());
    assert!(fx.interceptor.is_empty());

    let reported = fx.sink.of_kind(DiagnosticKind::NoMatch);
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].source, "tests.Manual");
    assert_eq!(reported[0].subject.as_deref(), Some("foo"));
    assert!(reported[0].message.contains(TARGET));
    assert!(reported[0].message.contains(UNRELATED));
}

#[test]
fn replacement_wins_over_same_named_before_hook() {
    let fx = Fixture::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let foo = DeclaredMethod::new("foo", move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Some(json!("replaced")))
    })
    .param(CONTEXT_TYPE)
    .intent(Intent::BeforeMethod, ["bar"])
    .intent(Intent::ReplaceMethod, ["bar"]);

    let hooks = fx.bind(Manual::new(vec![foo]));

    assert_eq!(hooks.len(), 2);
    assert!(
        hooks
            .bindings()
            .iter()
            .all(|b| b.intent() == Some(Intent::ReplaceMethod))
    );

    let ctx = fx.call("bar(int)", None, vec![json!(1)]);
    assert_eq!(ctx.result(), Some(&json!("replaced")));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn one_shot_constructor_bindings_are_independent() {
    let fx = Fixture::new();
    let journal = Journal::default();
    let hooks = fx.bind(Manual::new(vec![
        journal
            .hook("created")
            .param(OBJECT)
            .intent(Intent::BeforeConstructor, Vec::<String>::new())
            .one_shot(),
    ]));

    assert_eq!(
        signatures(&hooks),
        [
            "com.example.Target#<init>(int)",
            "com.example.Target#<init>(java.lang.String)"
        ]
    );
    assert!(hooks.bindings().iter().all(|b| b.is_one_shot()));

    fx.call("<init>(int)", None, vec![json!(1)]);
    fx.call("<init>(int)", None, vec![json!(2)]);
    assert_eq!(fx.interceptor.hook_count(&fx.member("<init>(int)")), 0);
    assert_eq!(
        fx.interceptor
            .hook_count(&fx.member("<init>(java.lang.String)")),
        1
    );

    fx.call("<init>(java.lang.String)", None, vec![json!("a")]);
    fx.call("<init>(java.lang.String)", None, vec![json!("b")]);
    assert_eq!(journal.entries(), ["created[1]", "created[\"a\"]"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameters and filters
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn placeholder_keeps_the_override_on_its_parameter() {
    let fx = Fixture::new();
    let journal = Journal::default();
    let hooks = fx.bind(Manual::new(vec![
        journal
            .hook("paired")
            .param(OBJECT)
            .param(OBJECT)
            .annotations(vec![
                vec![ParamAnnotation::Placeholder],
                vec![ParamAnnotation::named("int")],
            ])
            .intent(Intent::BeforeMethod, ["pair", "baz"]),
    ]));

    assert_eq!(
        signatures(&hooks),
        [
            "com.example.Target#baz(int,int)",
            "com.example.Target#pair(java.lang.String,int)"
        ]
    );
}

#[test]
fn override_without_placeholder_lands_on_the_first_slot() {
    let fx = Fixture::new();
    let journal = Journal::default();
    let hooks = fx.bind(Manual::new(vec![
        journal
            .hook("paired")
            .param(OBJECT)
            .param(OBJECT)
            .annotations(vec![vec![ParamAnnotation::named("int")]])
            .intent(Intent::BeforeMethod, ["pair"]),
    ]));

    assert!(hooks.is_empty());
    assert_eq!(fx.sink.of_kind(DiagnosticKind::NoMatch).len(), 1);
}

#[test]
fn unresolvable_override_silently_widens_the_match() {
    let fx = Fixture::new();
    let journal = Journal::default();
    let hooks = fx.bind(Manual::new(vec![
        journal
            .hook("wide")
            .annotated_param(OBJECT, vec![ParamAnnotation::named("com.example.Missing")])
            .intent(Intent::BeforeMethod, ["bar"]),
    ]));

    // The override was meant to narrow the match; it matches both overloads.
    assert_eq!(hooks.len(), 2);
    let reported = fx.sink.of_kind(DiagnosticKind::Resolution);
    assert_eq!(reported.len(), 1);
    assert!(reported[0].message.contains("com.example.Missing"));
}

#[test]
fn ambiguous_parameter_without_override_skips_only_that_method() {
    let fx = Fixture::new();
    let journal = Journal::default();
    let hooks = fx.bind(Manual::new(vec![
        journal
            .hook("ambiguous")
            .param("com.example.Missing")
            .intent(Intent::BeforeMethod, ["bar"]),
        journal
            .hook("loose")
            .param("Ljava/lang/Object;")
            .intent(Intent::AfterMethod, ["bar"]),
    ]));

    assert_eq!(hooks.state(), BindingState::Ready);
    assert_eq!(hooks.bindings_for("ambiguous").count(), 0);
    assert_eq!(hooks.bindings_for("loose").count(), 2);

    let reported = fx.sink.of_kind(DiagnosticKind::Configuration);
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].subject.as_deref(), Some("ambiguous"));
    assert!(fx.sink.of_kind(DiagnosticKind::NoMatch).is_empty());
}

#[test]
fn return_filter_accepts_descriptor_spelling() {
    let fx = Fixture::new();
    let journal = Journal::default();
    let hooks = fx.bind(Manual::new(vec![
        journal
            .hook("strings")
            .intent(Intent::AfterMethod, ["bar", "baz", "describe"])
            .return_type("Ljava/lang/String;"),
    ]));

    assert_eq!(
        signatures(&hooks),
        [
            "com.example.Target#bar(java.lang.String)",
            "com.example.Target#describe()"
        ]
    );
    assert!(hooks.bindings().iter().all(|b| b.timing() == Timing::After));
}

#[test]
fn bare_marker_binds_nothing() {
    let fx = Fixture::new();
    let journal = Journal::default();
    let hooks = fx.bind(Manual::new(vec![
        journal
            .hook("everything")
            .intent(Intent::BeforeMethod, Vec::<String>::new()),
    ]));

    assert!(hooks.is_empty());
    let reported = fx.sink.of_kind(DiagnosticKind::NoMatch);
    assert_eq!(reported.len(), 1);
    assert!(reported[0].message.contains("no filter"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle and failure isolation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn no_op_target_binds_nothing_quietly() {
    let fx = Fixture::new();
    let journal = Journal::default();
    let hooks = fx.bind(Manual::targeting(
        TargetSpec::no_op(),
        vec![journal.hook("foo").intent(Intent::BeforeMethod, ["bar"])],
    ));

    assert_eq!(hooks.state(), BindingState::Skipped);
    assert!(hooks.is_empty());
    assert!(fx.sink.is_empty());
}

#[test]
fn unknown_loader_fails_the_definition() {
    let fx = Fixture::new();
    let hooks = fx.bind(Manual::targeting(
        TargetSpec::new(TARGET).with_loader("plugins"),
        Vec::new(),
    ));

    assert_eq!(hooks.state(), BindingState::Failed);
    assert!(matches!(hooks.error(), Some(BindError::Target(_))));
    assert_eq!(fx.sink.of_kind(DiagnosticKind::Resolution).len(), 1);
}

#[test]
fn malformed_methods_do_not_stop_the_rest() {
    let fx = Fixture::new();
    let journal = Journal::default();
    let hooks = fx.bind(Manual::new(vec![
        DeclaredMethod::new("no_context", |_, _| Ok(None))
            .param("int")
            .intent(Intent::BeforeMethod, ["bar"]),
        journal.hook("fine").intent(Intent::BeforeMethod, ["describe"]),
    ]));

    assert_eq!(signatures(&hooks), ["com.example.Target#describe()"]);
    let reported = fx.sink.of_kind(DiagnosticKind::Configuration);
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].subject.as_deref(), Some("no_context"));
}

#[test]
fn failing_hook_is_reported_and_stays_installed() {
    let fx = Fixture::new();
    let hooks = fx.bind(Manual::new(vec![
        DeclaredMethod::new("grumpy", |_, _| Err(HookError::failed("not today")))
            .param(CONTEXT_TYPE)
            .intent(Intent::BeforeMethod, ["describe"]),
    ]));

    for _ in 0..2 {
        let ctx = fx.call("describe()", Some(json!({})), Vec::new());
        assert_eq!(ctx.result(), Some(&json!("original")));
    }

    let reported = fx.sink.of_kind(DiagnosticKind::UserCallback);
    assert_eq!(reported.len(), 2);
    assert!(reported[0].message.contains("not today"));
    assert!(fx.interceptor.contains_hook(hooks.bindings()[0].handle()));
}

#[test]
fn replacement_without_value_returns_null() {
    let fx = Fixture::new();
    let _hooks = fx.bind(Manual::new(vec![
        DeclaredMethod::new("silence", |_, _| Ok(None))
            .param(CONTEXT_TYPE)
            .intent(Intent::ReplaceMethod, ["describe"]),
    ]));

    let ctx = fx.call("describe()", None, Vec::new());
    assert_eq!(ctx.result(), Some(&Value::Null));
}

#[test]
fn one_shot_fires_once_under_concurrent_calls() {
    let fx = Fixture::new();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let _hooks = fx.bind(Manual::new(vec![
        DeclaredMethod::new("first", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        })
        .param(CONTEXT_TYPE)
        .intent(Intent::AfterMethod, ["describe"])
        .one_shot(),
    ]));

    let member = fx.member("describe()");
    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..16 {
                    fx.interceptor
                        .invoke(&member, None, None, |_, _| json!("original"));
                }
            });
        }
    });

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(!fx.interceptor.is_hooked(&member));
}

#[test]
fn unhook_all_restores_original_behavior() {
    let fx = Fixture::new();
    let mut hooks = fx.bind(Manual::new(vec![
        DeclaredMethod::new("swap", |_, _| Ok(Some(json!("swapped"))))
            .param(CONTEXT_TYPE)
            .intent(Intent::ReplaceMethod, ["describe", "bar"]),
    ]));
    assert_eq!(hooks.len(), 3);
    assert_eq!(hooks.bindings_for("swap").count(), 3);

    assert_eq!(
        fx.call("describe()", None, Vec::new()).result(),
        Some(&json!("swapped"))
    );
    assert_eq!(hooks.unhook_all(), 3);
    assert_eq!(
        fx.call("describe()", None, Vec::new()).result(),
        Some(&json!("original"))
    );
}
