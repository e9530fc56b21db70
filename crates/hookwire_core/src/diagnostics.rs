//! Process-wide diagnostics reporting.
//!
//! Everything the binding engine wants a human to see, but must not abort
//! on, is funneled through [`report`]: malformed hook methods, unresolvable
//! types, filters that matched nothing, errors raised inside installed
//! callbacks and registrations the interceptor refused.
//!
//! # Sinks
//!
//! A [`Diagnostic`] is delivered to exactly one [`DiagnosticSink`], chosen in
//! this order:
//!
//! 1. the innermost sink installed on the current thread with [`scoped`],
//! 2. the process-wide sink installed with [`install`],
//! 3. [`TracingSink`], which emits a `tracing` event.
//!
//! [`reset`] tears the process-wide sink down again.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hookwire_core::diagnostics::{self, CapturingSink, Diagnostic, DiagnosticKind};
//!
//! let sink = Arc::new(CapturingSink::new());
//! sink.capture(|| {
//!     diagnostics::report(Diagnostic::new(
//!         DiagnosticKind::NoMatch,
//!         "com.example.Hooks",
//!         "nothing matched",
//!     ));
//! });
//!
//! assert_eq!(sink.of_kind(DiagnosticKind::NoMatch).len(), 1);
//! ```

use core::cell::RefCell;
use core::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

// ─────────────────────────────────────────────────────────────────────────────
// Diagnostic
// ─────────────────────────────────────────────────────────────────────────────

/// Category of a reported problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A hook method is malformed (bad signature, missing context parameter,
    /// duplicate identity). The method is skipped.
    Configuration,
    /// A type name could not be resolved.
    Resolution,
    /// A hook method's filter matched no member of the target type.
    NoMatch,
    /// An installed callback returned an error or panicked.
    UserCallback,
    /// The interceptor refused to install a hook.
    Install,
}

impl DiagnosticKind {
    /// Returns a short, stable label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Resolution => "resolution",
            Self::NoMatch => "no-match",
            Self::UserCallback => "user-callback",
            Self::Install => "install",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// The hook definition the problem belongs to.
    pub source: String,
    /// The hook method or member involved, when there is one.
    pub subject: Option<String>,
    /// Human-readable details.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic without a subject.
    pub fn new(kind: DiagnosticKind, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            subject: None,
            message: message.into(),
        }
    }

    /// Sets the hook method or member the diagnostic is about.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.source)?;
        if let Some(subject) = &self.subject {
            write!(f, "::{subject}")?;
        }
        write!(f, ": {}", self.message)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sinks
// ─────────────────────────────────────────────────────────────────────────────

/// Receives reported diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Handles one diagnostic.
    fn report(&self, diagnostic: &Diagnostic);
}

/// Default sink: emits each diagnostic as a `tracing` event.
///
/// Configuration, callback and install problems are logged at `ERROR`,
/// resolution and no-match problems at `WARN`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        let subject = diagnostic.subject.as_deref().unwrap_or("");
        match diagnostic.kind {
            DiagnosticKind::Resolution | DiagnosticKind::NoMatch => tracing::warn!(
                kind = %diagnostic.kind,
                source = %diagnostic.source,
                subject,
                "{}",
                diagnostic.message
            ),
            DiagnosticKind::Configuration
            | DiagnosticKind::UserCallback
            | DiagnosticKind::Install => tracing::error!(
                kind = %diagnostic.kind,
                source = %diagnostic.source,
                subject,
                "{}",
                diagnostic.message
            ),
        }
    }
}

/// Sink that records every diagnostic it receives.
///
/// Use [`capture`](Self::capture) to route the current thread's diagnostics
/// into it for the duration of a closure.
#[derive(Debug, Default)]
pub struct CapturingSink {
    records: Mutex<Vec<Diagnostic>>,
}

impl CapturingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with this sink installed for the current thread.
    pub fn capture<R>(self: &Arc<Self>, f: impl FnOnce() -> R) -> R {
        scoped(Arc::clone(self) as Arc<dyn DiagnosticSink>, f)
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.records.lock().clone()
    }

    /// Returns the recorded diagnostics of one kind.
    #[must_use]
    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<Diagnostic> {
        self.records
            .lock()
            .iter()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect()
    }

    /// Returns the number of recorded diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl DiagnosticSink for CapturingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        self.records.lock().push(diagnostic.clone());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Process-wide state
// ─────────────────────────────────────────────────────────────────────────────

static GLOBAL_SINK: RwLock<Option<Arc<dyn DiagnosticSink>>> = parking_lot::const_rwlock(None);

thread_local! {
    static SCOPED_SINKS: RefCell<Vec<Arc<dyn DiagnosticSink>>> = const { RefCell::new(Vec::new()) };
}

/// Installs the process-wide sink, returning the one it replaces.
pub fn install(sink: Arc<dyn DiagnosticSink>) -> Option<Arc<dyn DiagnosticSink>> {
    GLOBAL_SINK.write().replace(sink)
}

/// Removes the process-wide sink, returning it. Diagnostics go to
/// [`TracingSink`] again afterwards.
pub fn reset() -> Option<Arc<dyn DiagnosticSink>> {
    GLOBAL_SINK.write().take()
}

struct ScopeGuard;

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPED_SINKS.with(|sinks| {
            sinks.borrow_mut().pop();
        });
    }
}

/// Runs `f` with `sink` receiving every diagnostic reported on this thread.
///
/// Scopes nest; the sink is removed again when `f` returns or unwinds.
pub fn scoped<R>(sink: Arc<dyn DiagnosticSink>, f: impl FnOnce() -> R) -> R {
    SCOPED_SINKS.with(|sinks| sinks.borrow_mut().push(sink));
    let _guard = ScopeGuard;
    f()
}

/// Reports a diagnostic to the active sink.
pub fn report(diagnostic: Diagnostic) {
    let scoped = SCOPED_SINKS.with(|sinks| sinks.borrow().last().cloned());
    if let Some(sink) = scoped {
        sink.report(&diagnostic);
        return;
    }

    let global = GLOBAL_SINK.read().clone();
    match global {
        Some(sink) => sink.report(&diagnostic),
        None => TracingSink.report(&diagnostic),
    }
}
