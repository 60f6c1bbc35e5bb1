// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Dependency Contract
//!
//! The narrow interface every downstream source exposes to the aggregation
//! core, plus the static descriptor ([`DependencySpec`]) and per-call result
//! ([`DependencyOutcome`]) types.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::aggregation::AggregationRequest;
use crate::domain::deadline::{ContextError, ExecutionContext};

/// Whether a dependency's success is required for the request to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Critical,
    BestEffort,
}

impl Criticality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criticality::Critical => "critical",
            Criticality::BestEffort => "best_effort",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyName(pub String);

impl DependencyName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DependencyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    #[error("{0} error")]
    Unavailable(String),
    #[error("call abandoned: {0}")]
    Context(#[from] ContextError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    Success,
    Failure,
    NotReady,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Failure => "failure",
            OutcomeStatus::NotReady => "not_ready",
        }
    }
}

/// Result of one dependency call within one aggregation.
///
/// The payload exists only on success and the cause only on failure.
/// `NotReady` covers both "did not finish before the window closed" and
/// "never reported at all".
#[derive(Debug, Clone, PartialEq)]
pub enum DependencyOutcome<P> {
    Success(P),
    Failure(DependencyError),
    NotReady,
}

impl<P> DependencyOutcome<P> {
    pub fn status(&self) -> OutcomeStatus {
        match self {
            DependencyOutcome::Success(_) => OutcomeStatus::Success,
            DependencyOutcome::Failure(_) => OutcomeStatus::Failure,
            DependencyOutcome::NotReady => OutcomeStatus::NotReady,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DependencyOutcome::Success(_))
    }

    pub fn payload(&self) -> Option<&P> {
        match self {
            DependencyOutcome::Success(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn into_payload(self) -> Option<P> {
        match self {
            DependencyOutcome::Success(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn cause(&self) -> Option<&DependencyError> {
        match self {
            DependencyOutcome::Failure(cause) => Some(cause),
            _ => None,
        }
    }
}

impl<P> From<Result<P, DependencyError>> for DependencyOutcome<P> {
    fn from(result: Result<P, DependencyError>) -> Self {
        match result {
            Ok(payload) => DependencyOutcome::Success(payload),
            Err(cause) => DependencyOutcome::Failure(cause),
        }
    }
}

/// A downstream source as seen by the aggregation core.
///
/// Implementations must watch `ctx` and give up promptly once it is done;
/// the aggregator will not wait for them to acknowledge.
#[async_trait]
pub trait Dependency<P>: Send + Sync {
    async fn call(
        &self,
        ctx: &ExecutionContext,
        request: &AggregationRequest,
    ) -> Result<P, DependencyError>;
}

/// Static per-dependency descriptor, built once and shared by all requests.
pub struct DependencySpec<P> {
    pub name: DependencyName,
    pub criticality: Criticality,
    pub dependency: Arc<dyn Dependency<P>>,
}

impl<P> DependencySpec<P> {
    pub fn new(
        name: impl Into<String>,
        criticality: Criticality,
        dependency: Arc<dyn Dependency<P>>,
    ) -> Self {
        Self {
            name: DependencyName::new(name),
            criticality,
            dependency,
        }
    }

    pub fn critical(name: impl Into<String>, dependency: Arc<dyn Dependency<P>>) -> Self {
        Self::new(name, Criticality::Critical, dependency)
    }

    pub fn best_effort(name: impl Into<String>, dependency: Arc<dyn Dependency<P>>) -> Self {
        Self::new(name, Criticality::BestEffort, dependency)
    }
}

impl<P> Clone for DependencySpec<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            criticality: self.criticality,
            dependency: Arc::clone(&self.dependency),
        }
    }
}

impl<P> fmt::Debug for DependencySpec<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencySpec")
            .field("name", &self.name)
            .field("criticality", &self.criticality)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_result() {
        let ok: DependencyOutcome<u32> = Ok(7).into();
        assert_eq!(ok.status(), OutcomeStatus::Success);
        assert_eq!(ok.payload(), Some(&7));
        assert!(ok.cause().is_none());

        let failed: DependencyOutcome<u32> =
            Err(DependencyError::Unavailable("user service".to_string())).into();
        assert_eq!(failed.status(), OutcomeStatus::Failure);
        assert!(failed.payload().is_none());
        assert_eq!(failed.cause().map(ToString::to_string).as_deref(), Some("user service error"));
    }

    #[test]
    fn test_not_ready_has_neither_payload_nor_cause() {
        let outcome: DependencyOutcome<u32> = DependencyOutcome::NotReady;
        assert!(!outcome.is_success());
        assert!(outcome.payload().is_none());
        assert!(outcome.cause().is_none());
        assert_eq!(outcome.into_payload(), None);
    }

    #[test]
    fn test_context_error_converts_into_dependency_error() {
        let err: DependencyError = ContextError::DeadlineExceeded.into();
        assert_eq!(err.to_string(), "call abandoned: deadline exceeded");
    }

    #[test]
    fn test_criticality_serde_names() {
        let yaml = serde_yaml::to_string(&Criticality::BestEffort).unwrap();
        assert_eq!(yaml.trim(), "best_effort");
        let parsed: Criticality = serde_yaml::from_str("critical").unwrap();
        assert_eq!(parsed, Criticality::Critical);
    }
}
