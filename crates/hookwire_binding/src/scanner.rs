//! Discovery of intent-tagged hook methods.
//!
//! [`scan`] validates a definition's declared methods and turns every
//! intent marker into one [`CandidateOperation`]. Malformed methods are
//! reported as configuration diagnostics and skipped; the rest of the scan
//! continues.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashSet;
use hookwire_core::diagnostics::{self, Diagnostic, DiagnosticKind};
use hookwire_reflect::MemberKind;

use crate::method::{CONTEXT_TYPE, DeclaredMethod, Intent};

// ─────────────────────────────────────────────────────────────────────────────
// CandidateOperation
// ─────────────────────────────────────────────────────────────────────────────

/// Identifies a candidate within one scan: method name plus intent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    /// Hook method name.
    pub name: String,
    /// Intent the method is tagged with.
    pub intent: Intent,
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.intent)
    }
}

/// One hook method tagged with one intent.
#[derive(Debug, Clone)]
pub struct CandidateOperation {
    method: Arc<DeclaredMethod>,
    intent: Intent,
    names: Vec<String>,
}

impl CandidateOperation {
    /// Returns the identity key.
    #[must_use]
    pub fn key(&self) -> IdentityKey {
        IdentityKey {
            name: self.method.name().to_string(),
            intent: self.intent,
        }
    }

    /// Returns the hook method name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.method.name()
    }

    /// Returns the underlying method.
    #[must_use]
    pub fn method(&self) -> &DeclaredMethod {
        &self.method
    }

    /// Returns the intent.
    #[must_use]
    pub fn intent(&self) -> Intent {
        self.intent
    }

    /// Returns the target member names this intent marker lists.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the return-type filter.
    #[must_use]
    pub fn return_filter(&self) -> Option<&str> {
        self.method.return_filter()
    }

    /// Returns `true` if bindings of this candidate are one-shot.
    #[must_use]
    pub fn is_one_shot(&self) -> bool {
        self.method.is_one_shot()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScanResult
// ─────────────────────────────────────────────────────────────────────────────

/// Candidates discovered on one hook definition, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    candidates: Vec<CandidateOperation>,
}

impl ScanResult {
    /// Returns the candidates tagged with `intent`.
    pub fn candidates(&self, intent: Intent) -> impl Iterator<Item = &CandidateOperation> {
        self.candidates.iter().filter(move |c| c.intent == intent)
    }

    /// Returns every candidate.
    #[must_use]
    pub fn all(&self) -> &[CandidateOperation] {
        &self.candidates
    }

    /// Returns the names of hook methods that replace members of `kind`.
    #[must_use]
    pub fn replaced_names(&self, kind: MemberKind) -> HashSet<&str> {
        self.candidates
            .iter()
            .filter(|c| c.intent.is_replace() && c.intent.member_kind() == kind)
            .map(CandidateOperation::name)
            .collect()
    }

    /// Returns the number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns `true` if no candidate was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// scan
// ─────────────────────────────────────────────────────────────────────────────

/// Scans `methods`, reporting problems under the definition name `source`.
pub fn scan(source: &str, methods: Vec<DeclaredMethod>) -> ScanResult {
    let mut seen: HashSet<IdentityKey> = HashSet::new();
    let mut candidates = Vec::new();

    for method in methods {
        if method.intents().is_empty() {
            tracing::trace!(method = method.name(), "method carries no intent marker");
            continue;
        }
        if let Err(problem) = validate(&method) {
            report_configuration(source, method.name(), problem);
            continue;
        }

        let method = Arc::new(method);
        for (intent, names) in method.intents() {
            let candidate = CandidateOperation {
                method: Arc::clone(&method),
                intent: *intent,
                names: names.clone(),
            };
            if !seen.insert(candidate.key()) {
                report_configuration(
                    source,
                    method.name(),
                    format!("duplicate hook method for {intent}; the first declaration is kept"),
                );
                continue;
            }
            candidates.push(candidate);
        }
    }

    tracing::debug!(source, candidates = candidates.len(), "hook methods scanned");
    ScanResult { candidates }
}

fn validate(method: &DeclaredMethod) -> Result<(), String> {
    let types = method.parameter_types();
    match types.first() {
        None => {
            return Err(format!(
                "hook method takes no parameters; the first must be {CONTEXT_TYPE}"
            ));
        }
        Some(first) if first != CONTEXT_TYPE => {
            return Err(format!(
                "first parameter is {first}; hook methods must take {CONTEXT_TYPE} first"
            ));
        }
        Some(_) => {}
    }

    if method.parameter_annotations().len() > types.len() {
        return Err(format!(
            "{} annotation lists for {} parameters",
            method.parameter_annotations().len(),
            types.len()
        ));
    }
    Ok(())
}

fn report_configuration(source: &str, method: &str, message: impl Into<String>) {
    diagnostics::report(
        Diagnostic::new(DiagnosticKind::Configuration, source, message).with_subject(method),
    );
}
