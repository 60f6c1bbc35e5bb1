// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Aggregation request and terminal result.
//!
//! ## Verdict Table
//! | CRITICAL outcomes | BEST_EFFORT outcomes | Verdict |
//! |-------------------|----------------------|---------|
//! | any not `Success` | (ignored)            | `Failed` |
//! | all `Success`     | any not `Success`    | `Degraded` |
//! | all `Success`     | all `Success`        | `Ok` |

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::deadline::DeadlineController;
use crate::domain::dependency::{Criticality, DependencyName, DependencyOutcome};

/// Malformed caller input, rejected before any aggregation starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientInputError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Immutable input for one aggregation.
///
/// The SLA travels as a validated [`DeadlineController`], so the window an
/// aggregation runs in is always the one the request reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationRequest {
    user_id: String,
    chat_id: String,
    deadline: DeadlineController,
}

impl AggregationRequest {
    pub fn new(
        user_id: impl Into<String>,
        chat_id: impl Into<String>,
        deadline: DeadlineController,
    ) -> Result<Self, ClientInputError> {
        let user_id = user_id.into();
        let chat_id = chat_id.into();

        if user_id.trim().is_empty() {
            return Err(ClientInputError::MissingParameter("user_id"));
        }
        if chat_id.trim().is_empty() {
            return Err(ClientInputError::MissingParameter("chat_id"));
        }

        Ok(Self {
            user_id,
            chat_id,
            deadline,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn sla(&self) -> Duration {
        self.deadline.sla()
    }

    pub fn deadline(&self) -> &DeadlineController {
        &self.deadline
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Ok,
    Degraded,
    Failed,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Ok => "ok",
            Verdict::Degraded => "degraded",
            Verdict::Failed => "failed",
        }
    }
}

/// Why a `Failed` verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// The deadline fired while CRITICAL work was still outstanding.
    SlaExceeded,
    /// The caller went away while CRITICAL work was still outstanding.
    CallerCancelled,
    /// Every CRITICAL dependency reported, at least one without success.
    CriticalDependency,
}

/// One dependency's final outcome inside an [`AggregationResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedOutcome<P> {
    pub name: DependencyName,
    pub criticality: Criticality,
    pub outcome: DependencyOutcome<P>,
}

/// Terminal decision of one aggregation.
///
/// The verdict is always derived from the outcomes, never supplied.
#[derive(Debug, Clone)]
pub struct AggregationResult<P> {
    outcomes: Vec<RecordedOutcome<P>>,
    verdict: Verdict,
    failure_cause: Option<FailureCause>,
    elapsed: Duration,
}

impl<P> AggregationResult<P> {
    /// Builds the result from the complete outcome set.
    ///
    /// `window_closed` records why the window closed early, if it did. It is
    /// ignored unless the outcomes themselves produce a `Failed` verdict.
    pub fn new(
        outcomes: Vec<RecordedOutcome<P>>,
        window_closed: Option<FailureCause>,
        elapsed: Duration,
    ) -> Self {
        let verdict = Self::verdict_for(&outcomes);
        let failure_cause = match verdict {
            Verdict::Failed => Some(window_closed.unwrap_or(FailureCause::CriticalDependency)),
            _ => None,
        };

        Self {
            outcomes,
            verdict,
            failure_cause,
            elapsed,
        }
    }

    fn verdict_for(outcomes: &[RecordedOutcome<P>]) -> Verdict {
        let mut verdict = Verdict::Ok;
        for recorded in outcomes.iter().filter(|r| !r.outcome.is_success()) {
            match recorded.criticality {
                Criticality::Critical => return Verdict::Failed,
                Criticality::BestEffort => verdict = Verdict::Degraded,
            }
        }
        verdict
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn failure_cause(&self) -> Option<FailureCause> {
        self.failure_cause
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn outcomes(&self) -> &[RecordedOutcome<P>] {
        &self.outcomes
    }

    pub fn outcome(&self, name: &str) -> Option<&DependencyOutcome<P>> {
        self.outcomes
            .iter()
            .find(|r| r.name.as_str() == name)
            .map(|r| &r.outcome)
    }

    /// CRITICAL dependencies that did not succeed.
    pub fn failed_by(&self) -> Vec<&DependencyName> {
        self.unsuccessful(Criticality::Critical)
    }

    /// BEST_EFFORT dependencies that did not succeed.
    pub fn degraded_by(&self) -> Vec<&DependencyName> {
        self.unsuccessful(Criticality::BestEffort)
    }

    fn unsuccessful(&self, criticality: Criticality) -> Vec<&DependencyName> {
        self.outcomes
            .iter()
            .filter(|r| r.criticality == criticality && !r.outcome.is_success())
            .map(|r| &r.name)
            .collect()
    }

    pub fn into_outcomes(self) -> Vec<RecordedOutcome<P>> {
        self.outcomes
    }
}
