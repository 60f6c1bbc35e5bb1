// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Chat Summary Service
//!
//! Wires the three chat dependencies into a [`ScatterGather`] engine and
//! builds a [`ChatSummary`] from whatever the aggregation selected.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::application::assembler::{assemble, AssembledResponse, SelectedPayloads};
use crate::application::scatter_gather::ScatterGather;
use crate::domain::aggregation::{AggregationRequest, ClientInputError};
use crate::domain::chat::{
    ChatCriticality, ChatPayload, ChatSummary, PermissionsService, UserService, VectorMemory,
    PERMISSIONS_DEPENDENCY, USER_DEPENDENCY, VECTOR_MEMORY_DEPENDENCY,
};
use crate::domain::deadline::{ConfigError, DeadlineController, ExecutionContext};
use crate::domain::dependency::{Dependency, DependencyError, DependencySpec};

/// The concrete downstream services one summary is built from.
#[derive(Clone)]
pub struct ChatDependencies {
    pub user: Arc<dyn UserService>,
    pub permissions: Arc<dyn PermissionsService>,
    pub vector_memory: Arc<dyn VectorMemory>,
}

struct UserLookup(Arc<dyn UserService>);

#[async_trait]
impl Dependency<ChatPayload> for UserLookup {
    async fn call(
        &self,
        ctx: &ExecutionContext,
        request: &AggregationRequest,
    ) -> Result<ChatPayload, DependencyError> {
        self.0.get_user(ctx, request.user_id()).await.map(ChatPayload::User)
    }
}

struct PermissionCheck(Arc<dyn PermissionsService>);

#[async_trait]
impl Dependency<ChatPayload> for PermissionCheck {
    async fn call(
        &self,
        ctx: &ExecutionContext,
        request: &AggregationRequest,
    ) -> Result<ChatPayload, DependencyError> {
        self.0
            .check_access(ctx, request.user_id(), request.chat_id())
            .await
            .map(ChatPayload::Permissions)
    }
}

struct ContextLookup(Arc<dyn VectorMemory>);

#[async_trait]
impl Dependency<ChatPayload> for ContextLookup {
    async fn call(
        &self,
        ctx: &ExecutionContext,
        request: &AggregationRequest,
    ) -> Result<ChatPayload, DependencyError> {
        self.0
            .get_context(ctx, request.chat_id())
            .await
            .map(ChatPayload::Context)
    }
}

pub struct ChatSummaryService {
    engine: ScatterGather<ChatPayload>,
    criticality: ChatCriticality,
    deadline: DeadlineController,
}

impl ChatSummaryService {
    pub fn new(
        dependencies: ChatDependencies,
        criticality: ChatCriticality,
        sla: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            engine: Self::engine(dependencies, criticality),
            criticality,
            deadline: DeadlineController::new(sla)?,
        })
    }

    fn engine(dependencies: ChatDependencies, criticality: ChatCriticality) -> ScatterGather<ChatPayload> {
        ScatterGather::new(vec![
            DependencySpec::new(
                USER_DEPENDENCY,
                criticality.user,
                Arc::new(UserLookup(dependencies.user)),
            ),
            DependencySpec::new(
                PERMISSIONS_DEPENDENCY,
                criticality.permissions,
                Arc::new(PermissionCheck(dependencies.permissions)),
            ),
            DependencySpec::new(
                VECTOR_MEMORY_DEPENDENCY,
                criticality.vector_memory,
                Arc::new(ContextLookup(dependencies.vector_memory)),
            ),
        ])
    }

    /// Same SLA and criticality, different downstream services.
    pub fn with_dependencies(&self, dependencies: ChatDependencies) -> Self {
        Self {
            engine: Self::engine(dependencies, self.criticality),
            criticality: self.criticality,
            deadline: self.deadline,
        }
    }

    pub fn sla(&self) -> Duration {
        self.deadline.sla()
    }

    pub fn criticality(&self) -> ChatCriticality {
        self.criticality
    }

    /// Builds the summary for one chat, bounded by the service SLA.
    ///
    /// Malformed identifiers are rejected before any dependency is called.
    pub async fn summarize(
        &self,
        user_id: &str,
        chat_id: &str,
        caller: &CancellationToken,
    ) -> Result<AssembledResponse<ChatSummary>, ClientInputError> {
        let request = AggregationRequest::new(user_id, chat_id, self.deadline)?;
        let result = self.engine.run(request, caller).await;
        Ok(assemble(result, build_summary))
    }
}

fn build_summary(payloads: SelectedPayloads<ChatPayload>) -> ChatSummary {
    let mut summary = ChatSummary {
        user: None,
        permissions: None,
        context: None,
        degraded: payloads.degraded(),
    };

    for (_, payload) in payloads {
        match payload {
            ChatPayload::User(user) => summary.user = Some(user),
            ChatPayload::Permissions(permissions) => summary.permissions = Some(permissions),
            ChatPayload::Context(context) => summary.context = Some(context),
        }
    }

    summary
}
