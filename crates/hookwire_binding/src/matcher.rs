//! Selection of the target members a candidate binds to.
//!
//! [`filter`] is a pure predicate over a member list: members are kept in
//! declaration order, and shuffling the input only reorders the output.

use core::fmt;

use hookwire_core::diagnostics::{self, Diagnostic, DiagnosticKind};
use hookwire_reflect::descriptor::canonical_name;
use hookwire_reflect::{LoaderId, Member, MemberKind, TypeResolver};

use crate::params::TypeConstraint;
use crate::scanner::CandidateOperation;

/// The three filters a candidate applies to target members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCriteria {
    names: Vec<String>,
    param_types: Vec<TypeConstraint>,
    return_type: Option<String>,
}

impl MatchCriteria {
    /// Creates criteria. A blank return filter counts as absent; any other
    /// filter is normalized to a canonical type name.
    pub fn new(
        names: Vec<String>,
        param_types: Vec<TypeConstraint>,
        return_filter: Option<&str>,
    ) -> Self {
        let return_type = return_filter
            .map(str::trim)
            .filter(|filter| !filter.is_empty())
            .map(|filter| canonical_name(filter).unwrap_or_else(|_| filter.to_string()));
        Self {
            names,
            param_types,
            return_type,
        }
    }

    /// Creates the criteria of `candidate` given its resolved parameter
    /// constraints.
    #[must_use]
    pub fn for_candidate(candidate: &CandidateOperation, param_types: Vec<TypeConstraint>) -> Self {
        Self::new(
            candidate.names().to_vec(),
            param_types,
            candidate.return_filter(),
        )
    }

    /// Returns the name filter.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the parameter filter.
    #[must_use]
    pub fn param_types(&self) -> &[TypeConstraint] {
        &self.param_types
    }

    /// Returns the normalized return filter.
    #[must_use]
    pub fn return_type(&self) -> Option<&str> {
        self.return_type.as_deref()
    }

    /// Returns `true` when no filter is set. Empty criteria match nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.param_types.is_empty() && self.return_type.is_none()
    }

    /// Returns whether `member` passes every filter for a candidate binding
    /// members of `kind`.
    ///
    /// Constructors ignore the name and return filters.
    pub fn matches(
        &self,
        member: &Member,
        kind: MemberKind,
        resolver: &dyn TypeResolver,
        loader: Option<&LoaderId>,
    ) -> bool {
        if self.is_empty() || member.kind() != kind {
            return false;
        }

        let constructor = member.is_constructor();

        if !constructor && !self.names.is_empty() && !self.names.iter().any(|n| n == member.name())
        {
            return false;
        }

        if !self.param_types.is_empty() {
            let params = member.parameter_types();
            if params.len() != self.param_types.len() {
                return false;
            }
            let compatible = self
                .param_types
                .iter()
                .zip(params)
                .all(|(constraint, param)| constraint.accepts(resolver, param, loader));
            if !compatible {
                return false;
            }
        }

        if !constructor && let Some(expected) = &self.return_type {
            return member.return_type() == Some(expected.as_str());
        }

        true
    }
}

impl fmt::Display for MatchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.param_types.iter().map(ToString::to_string).collect();
        write!(
            f,
            "names=[{}] params=[{}] return={}",
            self.names.join(", "),
            params.join(", "),
            self.return_type.as_deref().unwrap_or("*")
        )
    }
}

/// Returns the members of `kind` that satisfy `criteria`, in declaration
/// order.
pub fn filter(
    criteria: &MatchCriteria,
    members: &[Member],
    kind: MemberKind,
    resolver: &dyn TypeResolver,
    loader: Option<&LoaderId>,
) -> Vec<Member> {
    members
        .iter()
        .filter(|member| criteria.matches(member, kind, resolver, loader))
        .cloned()
        .collect()
}

/// Reports that `candidate` matched nothing on `target`.
pub fn report_no_match(
    source: &str,
    candidate: &CandidateOperation,
    target: &str,
    criteria: &MatchCriteria,
) {
    let message = if criteria.is_empty() {
        format!("{} declares no filter and binds nothing on {target}", candidate.intent())
    } else {
        format!(
            "{} matched no member of {target} ({criteria})",
            candidate.intent()
        )
    };
    diagnostics::report(
        Diagnostic::new(DiagnosticKind::NoMatch, source, message).with_subject(candidate.name()),
    );
}
