// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Fan-Out Dispatcher
//!
//! Starts one task per configured dependency. Each task reports exactly once
//! through its own single-slot channel; reporting never blocks, and a report
//! that arrives after the aggregator stopped listening is dropped.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, Instrument};

use crate::domain::aggregation::AggregationRequest;
use crate::domain::deadline::ExecutionContext;
use crate::domain::dependency::{Criticality, DependencyError, DependencyName, DependencySpec};

pub type Completion<P> = Result<P, DependencyError>;

/// A dispatched dependency call whose completion has not been consumed yet.
#[derive(Debug)]
pub struct PendingDependency<P> {
    pub name: DependencyName,
    pub criticality: Criticality,
    pub receiver: oneshot::Receiver<Completion<P>>,
}

/// Dispatch every spec concurrently against the shared context.
///
/// Must be called from within a Tokio runtime.
pub fn dispatch<P>(
    specs: &[DependencySpec<P>],
    ctx: &ExecutionContext,
    request: &Arc<AggregationRequest>,
) -> Vec<PendingDependency<P>>
where
    P: Send + 'static,
{
    specs
        .iter()
        .map(|spec| {
            let (sender, receiver) = oneshot::channel();
            let dependency = Arc::clone(&spec.dependency);
            let ctx = ctx.clone();
            let request = Arc::clone(request);
            let span = tracing::debug_span!("dependency", name = %spec.name);

            tokio::spawn(
                async move {
                    let completion = dependency.call(&ctx, &request).await;
                    if let Err(e) = &completion {
                        debug!(error = %e, "dependency call failed");
                    }
                    // receiver gone: aggregation already resolved
                    let _ = sender.send(completion);
                }
                .instrument(span),
            );

            PendingDependency {
                name: spec.name.clone(),
                criticality: spec.criticality,
                receiver,
            }
        })
        .collect()
}
