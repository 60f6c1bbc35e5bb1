// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Fan-In Aggregator
//!
//! Consumes dependency completions as they arrive and decides when the
//! aggregation is resolved.
//!
//! ## State Machine
//! | State | Event | Next |
//! |-------|-------|------|
//! | `WaitingCritical` | last CRITICAL reported | `CriticalDecided` |
//! | `WaitingCritical` | context done, CRITICAL missing | `Resolved` (`Failed`) |
//! | `WaitingCritical` | BEST_EFFORT reported | `WaitingCritical` |
//! | `CriticalDecided` | any CRITICAL unsuccessful | `Resolved` (`Failed`) |
//! | `CriticalDecided` | one non-blocking peek per BEST_EFFORT | `Resolved` (`Ok` / `Degraded`) |
//!
//! Completions are always polled before the context, so a CRITICAL result
//! that is ready at the same instant as the deadline is honored.
//!
//! A dependency that gave up because the context closed counts as
//! `NotReady`, not `Failure`: it did not finish in time.
//!
//! Once resolved the receivers are dropped: late completions are discarded.

use std::future::Future;
use std::pin::Pin;
use std::task::Poll;

use tokio::sync::oneshot::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::application::fan_out::{Completion, PendingDependency};
use crate::domain::aggregation::{AggregationResult, FailureCause, RecordedOutcome, Verdict};
use crate::domain::deadline::{ContextError, ExecutionContext};
use crate::domain::dependency::{Criticality, DependencyError, DependencyName, DependencyOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    WaitingCritical,
    CriticalDecided,
    Resolved,
}

struct Slot<P> {
    name: DependencyName,
    criticality: Criticality,
    receiver: Option<oneshot::Receiver<Completion<P>>>,
    outcome: Option<DependencyOutcome<P>>,
}

enum Event<P> {
    Completed(usize, Result<Completion<P>, RecvError>),
    WindowClosed,
}

pub struct FanInAggregator<P> {
    slots: Vec<Slot<P>>,
    state: AggregatorState,
}

impl<P> FanInAggregator<P>
where
    P: Send + 'static,
{
    pub fn new(pending: Vec<PendingDependency<P>>) -> Self {
        let slots = pending
            .into_iter()
            .map(|p| Slot {
                name: p.name,
                criticality: p.criticality,
                receiver: Some(p.receiver),
                outcome: None,
            })
            .collect();

        Self {
            slots,
            state: AggregatorState::WaitingCritical,
        }
    }

    pub fn state(&self) -> AggregatorState {
        self.state
    }

    /// Drive the state machine to `Resolved`.
    pub async fn resolve(mut self, ctx: &ExecutionContext) -> AggregationResult<P> {
        let mut window_closed = self.wait_for_critical(ctx).await;

        if window_closed.is_none() {
            self.state = AggregatorState::CriticalDecided;
            if self.critical_succeeded() {
                self.peek_best_effort();
            } else if self.critical_abandoned() {
                // reported, but only because the window closed
                window_closed = ctx.err().map(window_cause);
            }
        }

        self.state = AggregatorState::Resolved;
        self.finish(window_closed, ctx)
    }

    /// `WaitingCritical`: returns the reason the window closed if it closed
    /// before every CRITICAL dependency reported.
    async fn wait_for_critical(&mut self, ctx: &ExecutionContext) -> Option<FailureCause> {
        while self.critical_outstanding() > 0 {
            let event = tokio::select! {
                biased;
                (index, received) = next_completion(&mut self.slots) => Event::Completed(index, received),
                _ = ctx.done() => Event::WindowClosed,
            };

            match event {
                Event::Completed(index, received) => self.record(index, received),
                Event::WindowClosed => {
                    let cause = window_cause(ctx.err().unwrap_or(ContextError::DeadlineExceeded));
                    warn!(
                        outstanding = self.critical_outstanding(),
                        cause = ?cause,
                        "window closed before critical dependencies reported"
                    );
                    return Some(cause);
                }
            }
        }
        None
    }

    fn record(&mut self, index: usize, received: Result<Completion<P>, RecvError>) {
        let slot = &mut self.slots[index];
        slot.receiver = None;

        let outcome = match received {
            Ok(completion) => outcome_of(completion),
            // sender dropped without reporting
            Err(_) => DependencyOutcome::NotReady,
        };

        debug!(
            dependency = %slot.name,
            criticality = slot.criticality.as_str(),
            status = outcome.status().as_str(),
            "dependency reported"
        );
        slot.outcome = Some(outcome);
    }

    /// Single non-blocking look at every unreported BEST_EFFORT channel.
    fn peek_best_effort(&mut self) {
        for slot in self
            .slots
            .iter_mut()
            .filter(|s| s.criticality == Criticality::BestEffort && s.outcome.is_none())
        {
            let outcome = match slot.receiver.take().map(|mut r| r.try_recv()) {
                Some(Ok(completion)) => outcome_of(completion),
                _ => DependencyOutcome::NotReady,
            };
            debug!(
                dependency = %slot.name,
                status = outcome.status().as_str(),
                "best-effort dependency peeked"
            );
            slot.outcome = Some(outcome);
        }
    }

    fn critical_outstanding(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.criticality == Criticality::Critical && s.outcome.is_none())
            .count()
    }

    fn critical_abandoned(&self) -> bool {
        self.slots.iter().any(|s| {
            s.criticality == Criticality::Critical
                && matches!(s.outcome, Some(DependencyOutcome::NotReady))
        })
    }

    fn critical_succeeded(&self) -> bool {
        self.slots
            .iter()
            .filter(|s| s.criticality == Criticality::Critical)
            .all(|s| s.outcome.as_ref().is_some_and(DependencyOutcome::is_success))
    }

    fn finish(self, window_closed: Option<FailureCause>, ctx: &ExecutionContext) -> AggregationResult<P> {
        let outcomes = self
            .slots
            .into_iter()
            .map(|slot| RecordedOutcome {
                name: slot.name,
                criticality: slot.criticality,
                outcome: slot.outcome.unwrap_or(DependencyOutcome::NotReady),
            })
            .collect();

        let result = AggregationResult::new(outcomes, window_closed, ctx.elapsed());
        record_metrics(&result);

        match result.verdict() {
            Verdict::Failed => warn!(
                verdict = result.verdict().as_str(),
                cause = ?result.failure_cause(),
                elapsed_ms = result.elapsed().as_millis() as u64,
                "aggregation resolved"
            ),
            _ => info!(
                verdict = result.verdict().as_str(),
                elapsed_ms = result.elapsed().as_millis() as u64,
                "aggregation resolved"
            ),
        }

        result
    }
}

fn outcome_of<P>(completion: Completion<P>) -> DependencyOutcome<P> {
    match completion {
        Err(DependencyError::Context(_)) => DependencyOutcome::NotReady,
        other => DependencyOutcome::from(other),
    }
}

fn window_cause(err: ContextError) -> FailureCause {
    match err {
        ContextError::Cancelled => FailureCause::CallerCancelled,
        ContextError::DeadlineExceeded => FailureCause::SlaExceeded,
    }
}

/// Resolves with the first receiver that has a completion ready.
fn next_completion<P>(
    slots: &mut [Slot<P>],
) -> impl Future<Output = (usize, Result<Completion<P>, RecvError>)> + '_ {
    futures::future::poll_fn(move |cx| {
        for (index, slot) in slots.iter_mut().enumerate() {
            if let Some(receiver) = slot.receiver.as_mut() {
                if let Poll::Ready(received) = Pin::new(receiver).poll(cx) {
                    return Poll::Ready((index, received));
                }
            }
        }
        Poll::Pending
    })
}

fn record_metrics<P>(result: &AggregationResult<P>) {
    metrics::counter!("scatter_gather_aggregations_total", "verdict" => result.verdict().as_str())
        .increment(1);
    metrics::histogram!("scatter_gather_aggregation_duration_seconds")
        .record(result.elapsed().as_secs_f64());

    for recorded in result.outcomes() {
        metrics::counter!(
            "scatter_gather_dependency_outcomes_total",
            "dependency" => recorded.name.0.clone(),
            "status" => recorded.outcome.status().as_str()
        )
        .increment(1);
    }
}
