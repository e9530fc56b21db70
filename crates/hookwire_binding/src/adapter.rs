//! Closures bridging intercepted calls back to hook methods.
//!
//! Every closure built here catches what the hook method raises, whether
//! an `Err` or a panic, and reports it as a user-callback diagnostic. The
//! interceptor never sees the failure and the hook stays installed.

use core::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use hookwire_core::diagnostics::{self, Diagnostic, DiagnosticKind};
use hookwire_interceptor::{CallContext, MemberHook, Timing, Value};

use crate::definition::{AllConstructorsHook, AllMethodsHook};
use crate::error::HookError;
use crate::scanner::CandidateOperation;

/// Builds the hook installed for one matched candidate.
///
/// With `pass_args` the hook method receives the intercepted call's
/// arguments (none when the interceptor reports none); otherwise it receives
/// the context only. A replacement that yields no value produces
/// [`Value::Null`].
#[must_use]
pub fn candidate_hook(
    source: Arc<str>,
    candidate: &CandidateOperation,
    pass_args: bool,
) -> MemberHook {
    let invoker = Arc::clone(candidate.method().invoker());
    let method: Arc<str> = Arc::from(candidate.name());

    let call = move |ctx: &mut CallContext| -> Option<Value> {
        let args: Vec<Value> = if pass_args {
            ctx.args().map(<[Value]>::to_vec).unwrap_or_default()
        } else {
            Vec::new()
        };
        guarded(&source, &method, ctx, |ctx| invoker(ctx, &args)).flatten()
    };

    let hook = match candidate.intent().timing() {
        Timing::Before => MemberHook::before(move |ctx| {
            call(ctx);
        }),
        Timing::After => MemberHook::after(move |ctx| {
            call(ctx);
        }),
        Timing::Replace => MemberHook::replace(move |ctx| call(ctx).unwrap_or(Value::Null)),
    };

    if candidate.is_one_shot() {
        hook.once()
    } else {
        hook
    }
}

/// Builds the before/after pair installed by the all-methods catch-all.
///
/// The after half does nothing for calls without a receiver.
#[must_use]
pub fn all_methods_hooks(
    source: Arc<str>,
    dispatcher: Arc<dyn AllMethodsHook>,
) -> (MemberHook, MemberHook) {
    let before = {
        let (source, dispatcher) = (Arc::clone(&source), Arc::clone(&dispatcher));
        MemberHook::before(move |ctx| {
            guarded(&source, "before_all_methods", ctx, |ctx| {
                dispatcher.before_all_methods(ctx)
            });
        })
    };
    let after = MemberHook::after(move |ctx| {
        if ctx.this().is_none() {
            return;
        }
        guarded(&source, "after_all_methods", ctx, |ctx| {
            dispatcher.after_all_methods(ctx)
        });
    });
    (before, after)
}

/// Builds the before/after pair installed by the all-constructors
/// catch-all.
///
/// The after half does nothing when the constructor produced no instance.
#[must_use]
pub fn all_constructors_hooks(
    source: Arc<str>,
    dispatcher: Arc<dyn AllConstructorsHook>,
) -> (MemberHook, MemberHook) {
    let before = {
        let (source, dispatcher) = (Arc::clone(&source), Arc::clone(&dispatcher));
        MemberHook::before(move |ctx| {
            guarded(&source, "before_all_constructors", ctx, |ctx| {
                dispatcher.before_all_constructors(ctx)
            });
        })
    };
    let after = MemberHook::after(move |ctx| {
        if ctx.this().is_none() {
            return;
        }
        guarded(&source, "after_all_constructors", ctx, |ctx| {
            dispatcher.after_all_constructors(ctx)
        });
    });
    (before, after)
}

/// Runs `f`, reporting an `Err` or a panic as a user-callback diagnostic.
fn guarded<T>(
    source: &str,
    method: &str,
    ctx: &mut CallContext,
    f: impl FnOnce(&mut CallContext) -> Result<T, HookError>,
) -> Option<T> {
    let signature = ctx.member().signature();
    let message = match catch_unwind(AssertUnwindSafe(|| f(ctx))) {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(err)) => format!("{signature}: {err}"),
        Err(payload) => format!("{signature}: panicked: {}", panic_message(&*payload)),
    };
    diagnostics::report(
        Diagnostic::new(DiagnosticKind::UserCallback, source, message).with_subject(method),
    );
    None
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
