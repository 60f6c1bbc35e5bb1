// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end aggregation scenarios against the simulated services.
//!
//! All tests run on paused Tokio time, so latencies are exact and the
//! suite does not actually sleep.

use std::time::Duration;

use scatter_gather_core::application::assembler::{AggregationFailure, AssembledResponse};
use scatter_gather_core::application::chat_summary::ChatSummaryService;
use scatter_gather_core::domain::aggregation::Verdict;
use scatter_gather_core::domain::chat::{ChatCriticality, ChatSummary};
use scatter_gather_core::infrastructure::simulated::{SimulatedBehavior, SimulationProfile};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const SLA: Duration = Duration::from_millis(200);

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn profile(user: u64, permissions: u64, vector_memory: u64) -> SimulationProfile {
    SimulationProfile {
        user: SimulatedBehavior::new(ms(user), false),
        permissions: SimulatedBehavior::new(ms(permissions), false),
        permissions_allowed: true,
        vector_memory: SimulatedBehavior::new(ms(vector_memory), false),
    }
}

fn service(profile: SimulationProfile) -> ChatSummaryService {
    ChatSummaryService::new(profile.build(), ChatCriticality::default(), SLA).unwrap()
}

async fn summarize(service: &ChatSummaryService) -> (AssembledResponse<ChatSummary>, Duration) {
    let started = Instant::now();
    let response = service
        .summarize("1", "42", &CancellationToken::new())
        .await
        .unwrap();
    (response, started.elapsed())
}

fn assert_between(elapsed: Duration, low: u64, high: u64) {
    assert!(
        elapsed >= ms(low) && elapsed < ms(high),
        "elapsed {:?} outside [{}ms, {}ms)",
        elapsed,
        low,
        high
    );
}

#[tokio::test(start_paused = true)]
async fn test_all_dependencies_in_time_is_ok() {
    let (response, elapsed) = summarize(&service(profile(10, 50, 20))).await;

    let summary = match response {
        AssembledResponse::Complete(summary) => summary,
        other => panic!("expected complete response, got {:?}", other),
    };
    assert!(!summary.degraded);
    assert_eq!(summary.user.map(|u| u.id).as_deref(), Some("1"));
    assert_eq!(summary.permissions.map(|p| p.allowed), Some(true));
    assert_eq!(summary.context.map(|c| c.source).as_deref(), Some("vector"));
    assert_between(elapsed, 50, 60);
}

#[tokio::test(start_paused = true)]
async fn test_slow_best_effort_degrades_at_critical_latency() {
    let (response, elapsed) = summarize(&service(profile(10, 50, 3000))).await;

    let summary = match response {
        AssembledResponse::Degraded(summary) => summary,
        other => panic!("expected degraded response, got {:?}", other),
    };
    assert!(summary.degraded);
    assert!(summary.context.is_none());
    assert!(summary.user.is_some() && summary.permissions.is_some());
    assert_between(elapsed, 50, 60);
}

#[tokio::test(start_paused = true)]
async fn test_best_effort_slower_than_criticals_is_not_awaited() {
    // 100ms vector memory is well inside the SLA but finishes after the criticals
    let (response, elapsed) = summarize(&service(profile(10, 50, 100))).await;

    assert_eq!(response.verdict(), Verdict::Degraded);
    let summary = response.into_result().unwrap();
    assert!(summary.context.is_none());
    assert_between(elapsed, 50, 60);
}

#[tokio::test(start_paused = true)]
async fn test_failing_best_effort_degrades() {
    let mut failing = profile(10, 50, 5);
    failing.vector_memory.fail = true;

    let (response, _) = summarize(&service(failing)).await;

    assert_eq!(response.verdict(), Verdict::Degraded);
}

#[tokio::test(start_paused = true)]
async fn test_failing_critical_fails_before_sla() {
    let mut failing = profile(10, 50, 100);
    failing.user.fail = true;

    let (response, elapsed) = summarize(&service(failing)).await;

    assert_eq!(
        response,
        AssembledResponse::Failed(AggregationFailure::DependencyFailure {
            failed: vec!["user".to_string()]
        })
    );
    assert!(elapsed < SLA);
}

#[tokio::test(start_paused = true)]
async fn test_slow_critical_fails_at_sla() {
    let (response, elapsed) = summarize(&service(profile(10, 250, 100))).await;

    assert_eq!(
        response,
        AssembledResponse::Failed(AggregationFailure::SlaExceeded {
            pending: vec!["permissions".to_string()]
        })
    );
    assert_between(elapsed, 200, 210);
}

#[tokio::test(start_paused = true)]
async fn test_caller_disconnect_fails_without_waiting_for_sla() {
    let service = service(profile(10, 150, 100));
    let caller = CancellationToken::new();

    let canceller = caller.clone();
    tokio::spawn(async move {
        tokio::time::sleep(ms(30)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let response = service.summarize("1", "42", &caller).await.unwrap();

    assert_eq!(
        response,
        AssembledResponse::Failed(AggregationFailure::CallerCancelled)
    );
    assert_between(started.elapsed(), 30, 40);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_are_isolated() {
    let base = service(profile(10, 50, 20));
    let slow_permissions = base.with_dependencies(profile(10, 250, 20).build());
    let slow_memory = base.with_dependencies(profile(10, 50, 3000).build());

    let ((fast, _), (failed, _), (degraded, _)) = tokio::join!(
        summarize(&base),
        summarize(&slow_permissions),
        summarize(&slow_memory),
    );

    assert_eq!(fast.verdict(), Verdict::Ok);
    assert_eq!(failed.verdict(), Verdict::Failed);
    assert_eq!(degraded.verdict(), Verdict::Degraded);

    // the shared service still answers normally afterwards
    let (again, _) = summarize(&base).await;
    assert_eq!(again.verdict(), Verdict::Ok);
}

#[tokio::test(start_paused = true)]
async fn test_denied_permissions_still_succeed() {
    let mut denied = profile(10, 50, 20);
    denied.permissions_allowed = false;

    let (response, _) = summarize(&service(denied)).await;

    let summary = response.into_result().unwrap();
    assert_eq!(summary.permissions.map(|p| p.allowed), Some(false));
}
