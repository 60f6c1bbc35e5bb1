// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Response Assembler
//!
//! Turns a resolved [`AggregationResult`] into what the caller sees. A
//! `Failed` verdict never carries partial data.

use thiserror::Error;

use crate::domain::aggregation::{AggregationResult, FailureCause, Verdict};
use crate::domain::dependency::{Criticality, DependencyName, DependencyOutcome};

/// Why an aggregation produced no response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationFailure {
    #[error("critical dependency missed the SLA: {}", pending.join(", "))]
    SlaExceeded { pending: Vec<String> },

    #[error("request cancelled by caller")]
    CallerCancelled,

    #[error("critical dependency failed: {}", failed.join(", "))]
    DependencyFailure { failed: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssembledResponse<T> {
    Complete(T),
    Degraded(T),
    Failed(AggregationFailure),
}

impl<T> AssembledResponse<T> {
    pub fn verdict(&self) -> Verdict {
        match self {
            AssembledResponse::Complete(_) => Verdict::Ok,
            AssembledResponse::Degraded(_) => Verdict::Degraded,
            AssembledResponse::Failed(_) => Verdict::Failed,
        }
    }

    pub fn into_result(self) -> Result<T, AggregationFailure> {
        match self {
            AssembledResponse::Complete(body) | AssembledResponse::Degraded(body) => Ok(body),
            AssembledResponse::Failed(failure) => Err(failure),
        }
    }
}

/// Payloads the response is allowed to contain.
///
/// Every CRITICAL payload is present; a BEST_EFFORT payload is present only
/// if that dependency succeeded in time.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedPayloads<P> {
    entries: Vec<(DependencyName, P)>,
    degraded: bool,
}

impl<P> SelectedPayloads<P> {
    pub fn degraded(&self) -> bool {
        self.degraded
    }

    pub fn get(&self, name: &str) -> Option<&P> {
        self.entries
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P> IntoIterator for SelectedPayloads<P> {
    type Item = (DependencyName, P);
    type IntoIter = std::vec::IntoIter<(DependencyName, P)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

pub fn assemble<P, T, F>(result: AggregationResult<P>, build: F) -> AssembledResponse<T>
where
    F: FnOnce(SelectedPayloads<P>) -> T,
{
    let verdict = result.verdict();
    if verdict == Verdict::Failed {
        return AssembledResponse::Failed(failure_of(&result));
    }

    let mut entries = Vec::new();
    let mut degraded = false;
    for recorded in result.into_outcomes() {
        match (recorded.criticality, recorded.outcome) {
            (_, DependencyOutcome::Success(payload)) => entries.push((recorded.name, payload)),
            (Criticality::BestEffort, _) => degraded = true,
            // unreachable for a non-failed verdict
            (Criticality::Critical, _) => {}
        }
    }

    let body = build(SelectedPayloads { entries, degraded });
    match verdict {
        Verdict::Ok => AssembledResponse::Complete(body),
        _ => AssembledResponse::Degraded(body),
    }
}

fn failure_of<P>(result: &AggregationResult<P>) -> AggregationFailure {
    let names = || -> Vec<String> { result.failed_by().iter().map(ToString::to_string).collect() };
    match result.failure_cause() {
        Some(FailureCause::CallerCancelled) => AggregationFailure::CallerCancelled,
        Some(FailureCause::SlaExceeded) => AggregationFailure::SlaExceeded { pending: names() },
        _ => AggregationFailure::DependencyFailure { failed: names() },
    }
}
