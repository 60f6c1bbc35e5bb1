// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Chat summary domain: typed downstream contracts and payloads.
//!
//! Each service below is one Dependency Contract kind. Implementations live
//! in `infrastructure`; the application layer adapts them to the generic
//! [`Dependency`](crate::domain::dependency::Dependency) trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::deadline::ExecutionContext;
use crate::domain::dependency::{Criticality, DependencyError};

pub const USER_DEPENDENCY: &str = "user";
pub const PERMISSIONS_DEPENDENCY: &str = "permissions";
pub const VECTOR_MEMORY_DEPENDENCY: &str = "vector_memory";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub chat_id: String,
    pub user_id: String,
    pub allowed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorContext {
    pub chat_id: String,
    pub snippet: String,
    pub source: String,
    pub latency_ms: u64,
}

/// Caller-facing chat summary.
///
/// `context` is omitted whenever vector memory did not succeed in time, in
/// which case `degraded` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<VectorContext>,
    pub degraded: bool,
}

/// Payload carried through the aggregation for the chat summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatPayload {
    User(User),
    Permissions(Permissions),
    Context(VectorContext),
}

#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self, ctx: &ExecutionContext, user_id: &str) -> Result<User, DependencyError>;
}

#[async_trait]
pub trait PermissionsService: Send + Sync {
    async fn check_access(
        &self,
        ctx: &ExecutionContext,
        user_id: &str,
        chat_id: &str,
    ) -> Result<Permissions, DependencyError>;
}

#[async_trait]
pub trait VectorMemory: Send + Sync {
    async fn get_context(
        &self,
        ctx: &ExecutionContext,
        chat_id: &str,
    ) -> Result<VectorContext, DependencyError>;
}

/// Criticality assigned to each chat dependency at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCriticality {
    pub user: Criticality,
    pub permissions: Criticality,
    pub vector_memory: Criticality,
}

impl Default for ChatCriticality {
    fn default() -> Self {
        Self {
            user: Criticality::Critical,
            permissions: Criticality::Critical,
            vector_memory: Criticality::BestEffort,
        }
    }
}
