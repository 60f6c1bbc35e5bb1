// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Runs one deadline-bounded aggregation end to end: open the window,
//! fan out, fan in, close the window.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::application::fan_in::FanInAggregator;
use crate::application::fan_out::dispatch;
use crate::domain::aggregation::{AggregationRequest, AggregationResult};
use crate::domain::dependency::DependencySpec;

/// A fixed dependency set shared read-only by every request.
pub struct ScatterGather<P> {
    specs: Arc<[DependencySpec<P>]>,
}

impl<P> Clone for ScatterGather<P> {
    fn clone(&self) -> Self {
        Self {
            specs: Arc::clone(&self.specs),
        }
    }
}

impl<P> ScatterGather<P>
where
    P: Send + 'static,
{
    pub fn new(specs: Vec<DependencySpec<P>>) -> Self {
        Self { specs: specs.into() }
    }

    pub fn specs(&self) -> &[DependencySpec<P>] {
        &self.specs
    }

    /// Aggregates within `request.sla()`, or until `caller` is cancelled.
    ///
    /// Dependency calls still running when this returns are signalled to stop.
    pub async fn run(&self, request: AggregationRequest, caller: &CancellationToken) -> AggregationResult<P> {
        let span = tracing::info_span!(
            "aggregation",
            user_id = request.user_id(),
            chat_id = request.chat_id(),
            sla_ms = request.sla().as_millis() as u64,
        );

        async move {
            let scope = request.deadline().start(caller);
            let request = Arc::new(request);
            let pending = dispatch(&self.specs, scope.context(), &request);
            FanInAggregator::new(pending).resolve(scope.context()).await
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregation::Verdict;
    use crate::domain::deadline::{ContextError, DeadlineController, ExecutionContext};
    use crate::domain::dependency::{Dependency, DependencyError};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn request(sla: Duration) -> AggregationRequest {
        AggregationRequest::new("1", "42", DeadlineController::new(sla).unwrap()).unwrap()
    }

    /// Sleeps, then reports whether it finished or was told to stop.
    struct Watched {
        latency: Duration,
        observed: mpsc::UnboundedSender<Result<(), ContextError>>,
    }

    #[async_trait]
    impl Dependency<u8> for Watched {
        async fn call(&self, ctx: &ExecutionContext, _request: &AggregationRequest) -> Result<u8, DependencyError> {
            let slept = ctx.sleep(self.latency).await;
            let _ = self.observed.send(slept);
            slept?;
            Ok(1)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolution_cancels_outstanding_best_effort_call() {
        let (observed, mut events) = mpsc::unbounded_channel();
        let fast: Arc<dyn Dependency<u8>> = Arc::new(Watched {
            latency: Duration::from_millis(10),
            observed: observed.clone(),
        });
        let slow: Arc<dyn Dependency<u8>> = Arc::new(Watched {
            latency: Duration::from_secs(3),
            observed,
        });
        let engine = ScatterGather::new(vec![
            DependencySpec::critical("fast", fast),
            DependencySpec::best_effort("slow", slow),
        ]);

        let started = tokio::time::Instant::now();
        let request = request(Duration::from_millis(200));
        let result = engine.run(request, &CancellationToken::new()).await;
        assert_eq!(result.verdict(), Verdict::Degraded);

        assert_eq!(events.recv().await, Some(Ok(())));
        // the slow call is told to stop long before its 3s latency
        assert_eq!(events.recv().await, Some(Err(ContextError::Cancelled)));
        assert!(started.elapsed() < Duration::from_millis(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_follows_request_sla() {
        let (observed, _events) = mpsc::unbounded_channel();
        let stuck: Arc<dyn Dependency<u8>> = Arc::new(Watched {
            latency: Duration::from_secs(3),
            observed,
        });
        let engine = ScatterGather::new(vec![DependencySpec::critical("stuck", stuck)]);

        for sla in [Duration::from_millis(80), Duration::from_millis(150)] {
            let started = tokio::time::Instant::now();
            let result = engine.run(request(sla), &CancellationToken::new()).await;

            assert_eq!(result.verdict(), Verdict::Failed);
            assert!(started.elapsed() >= sla && started.elapsed() < sla + Duration::from_millis(10));
        }
    }

    #[test]
    fn test_clones_share_specs() {
        let engine: ScatterGather<u8> = ScatterGather::new(Vec::new());
        let clone = engine.clone();
        assert!(std::ptr::eq(engine.specs(), clone.specs()));
    }
}
