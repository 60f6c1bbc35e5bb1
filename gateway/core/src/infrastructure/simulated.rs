// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Simulated Downstream Services
//!
//! In-process stand-ins for the user, permissions and vector memory
//! services. Each waits its configured latency (giving up as soon as the
//! execution context is done), then either fails or answers with a canned
//! payload.
//!
//! A [`SimulationProfile`] is an immutable description of all three; a
//! per-request profile is derived with [`SimulationProfile::with_overrides`]
//! and built into a fresh [`ChatDependencies`] set, so shared services are
//! never mutated.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::application::chat_summary::ChatDependencies;
use crate::domain::chat::{Permissions, PermissionsService, User, UserService, VectorContext, VectorMemory};
use crate::domain::deadline::ExecutionContext;
use crate::domain::dependency::DependencyError;
use crate::domain::gateway_config::{DependenciesConfig, DependencySettings};

const USER_SERVICE: &str = "user service";
const PERMISSIONS_SERVICE: &str = "permissions service";
const VECTOR_MEMORY: &str = "vector memory";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatedBehavior {
    pub latency: Duration,
    pub fail: bool,
}

impl SimulatedBehavior {
    pub fn new(latency: Duration, fail: bool) -> Self {
        Self { latency, fail }
    }

    async fn perform(&self, ctx: &ExecutionContext, service: &str) -> Result<(), DependencyError> {
        ctx.sleep(self.latency).await?;
        if self.fail {
            return Err(DependencyError::Unavailable(service.to_string()));
        }
        Ok(())
    }
}

impl From<&DependencySettings> for SimulatedBehavior {
    fn from(settings: &DependencySettings) -> Self {
        Self::new(settings.latency, settings.fail)
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedUserService {
    behavior: SimulatedBehavior,
}

impl SimulatedUserService {
    pub fn new(behavior: SimulatedBehavior) -> Self {
        Self { behavior }
    }
}

#[async_trait]
impl UserService for SimulatedUserService {
    async fn get_user(&self, ctx: &ExecutionContext, user_id: &str) -> Result<User, DependencyError> {
        self.behavior.perform(ctx, USER_SERVICE).await?;
        Ok(User {
            id: user_id.to_string(),
            name: "Ivan".to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedPermissionsService {
    behavior: SimulatedBehavior,
    allowed: bool,
}

impl SimulatedPermissionsService {
    pub fn new(behavior: SimulatedBehavior, allowed: bool) -> Self {
        Self { behavior, allowed }
    }
}

#[async_trait]
impl PermissionsService for SimulatedPermissionsService {
    async fn check_access(
        &self,
        ctx: &ExecutionContext,
        user_id: &str,
        chat_id: &str,
    ) -> Result<Permissions, DependencyError> {
        self.behavior.perform(ctx, PERMISSIONS_SERVICE).await?;
        Ok(Permissions {
            chat_id: chat_id.to_string(),
            user_id: user_id.to_string(),
            allowed: self.allowed,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedVectorMemory {
    behavior: SimulatedBehavior,
}

impl SimulatedVectorMemory {
    pub fn new(behavior: SimulatedBehavior) -> Self {
        Self { behavior }
    }
}

#[async_trait]
impl VectorMemory for SimulatedVectorMemory {
    async fn get_context(&self, ctx: &ExecutionContext, chat_id: &str) -> Result<VectorContext, DependencyError> {
        let started = Instant::now();
        self.behavior.perform(ctx, VECTOR_MEMORY).await?;
        Ok(VectorContext {
            chat_id: chat_id.to_string(),
            snippet: "Context from vector memory (sample)".to_string(),
            source: "vector".to_string(),
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Behavior of all three simulated services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationProfile {
    pub user: SimulatedBehavior,
    pub permissions: SimulatedBehavior,
    pub permissions_allowed: bool,
    pub vector_memory: SimulatedBehavior,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self::from(&DependenciesConfig::default())
    }
}

impl From<&DependenciesConfig> for SimulationProfile {
    fn from(config: &DependenciesConfig) -> Self {
        Self {
            user: SimulatedBehavior::from(&config.user),
            permissions: SimulatedBehavior::from(&config.permissions.settings),
            permissions_allowed: config.permissions.allowed,
            vector_memory: SimulatedBehavior::from(&config.vector_memory),
        }
    }
}

impl SimulationProfile {
    /// A copy of this profile with every present override applied.
    pub fn with_overrides(&self, overrides: &SimulationOverrides) -> Self {
        let mut profile = *self;
        apply(&mut profile.user, overrides.user_delay, overrides.user_fail);
        apply(&mut profile.permissions, overrides.perms_delay, overrides.perms_fail);
        apply(&mut profile.vector_memory, overrides.vm_delay, overrides.vm_fail);
        if let Some(allowed) = overrides.perms_allowed {
            profile.permissions_allowed = allowed;
        }
        profile
    }

    pub fn build(&self) -> ChatDependencies {
        ChatDependencies {
            user: Arc::new(SimulatedUserService::new(self.user)),
            permissions: Arc::new(SimulatedPermissionsService::new(
                self.permissions,
                self.permissions_allowed,
            )),
            vector_memory: Arc::new(SimulatedVectorMemory::new(self.vector_memory)),
        }
    }
}

fn apply(behavior: &mut SimulatedBehavior, latency: Option<Duration>, fail: Option<bool>) {
    if let Some(latency) = latency {
        behavior.latency = latency;
    }
    if let Some(fail) = fail {
        behavior.fail = fail;
    }
}

/// Per-request simulation parameters taken from the query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationOverrides {
    pub user_delay: Option<Duration>,
    pub user_fail: Option<bool>,
    pub perms_delay: Option<Duration>,
    pub perms_fail: Option<bool>,
    pub perms_allowed: Option<bool>,
    pub vm_delay: Option<Duration>,
    pub vm_fail: Option<bool>,
}

impl SimulationOverrides {
    /// Values that do not parse are ignored.
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let duration = |key: &str| params.get(key).and_then(|v| parse_duration(v));
        let flag = |key: &str| params.get(key).and_then(|v| parse_flag(v));

        Self {
            user_delay: duration("user_delay"),
            user_fail: flag("user_fail"),
            perms_delay: duration("perms_delay"),
            perms_fail: flag("perms_fail"),
            perms_allowed: flag("perms_allowed"),
            vm_delay: duration("vm_delay"),
            vm_fail: flag("vm_fail"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn parse_duration(value: &str) -> Option<Duration> {
    humantime::parse_duration(value.trim()).ok()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deadline::{ContextError, DeadlineController};
    use tokio_util::sync::CancellationToken;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_overrides_parse_durations_and_flags() {
        let overrides = SimulationOverrides::from_query(&query(&[
            ("user_delay", "250ms"),
            ("perms_fail", "YES"),
            ("perms_allowed", "n"),
            ("vm_delay", "3s"),
            ("vm_fail", "0"),
        ]));

        assert_eq!(overrides.user_delay, Some(Duration::from_millis(250)));
        assert_eq!(overrides.user_fail, None);
        assert_eq!(overrides.perms_fail, Some(true));
        assert_eq!(overrides.perms_allowed, Some(false));
        assert_eq!(overrides.vm_delay, Some(Duration::from_secs(3)));
        assert_eq!(overrides.vm_fail, Some(false));
        assert!(!overrides.is_empty());
    }

    #[test]
    fn test_unparsable_overrides_are_ignored() {
        let overrides = SimulationOverrides::from_query(&query(&[
            ("user_delay", "soon"),
            ("user_fail", "maybe"),
            ("vm_delay", ""),
            ("user_id", "1"),
        ]));

        assert!(overrides.is_empty());
    }

    #[test]
    fn test_with_overrides_leaves_base_untouched() {
        let base = SimulationProfile::default();
        let overrides = SimulationOverrides {
            perms_delay: Some(Duration::from_millis(250)),
            perms_allowed: Some(false),
            ..Default::default()
        };

        let derived = base.with_overrides(&overrides);

        assert_eq!(derived.permissions.latency, Duration::from_millis(250));
        assert!(!derived.permissions_allowed);
        assert_eq!(derived.user, base.user);
        assert_eq!(base.permissions.latency, Duration::from_millis(50));
        assert!(base.permissions_allowed);
    }

    #[test]
    fn test_profile_from_config_defaults() {
        let profile = SimulationProfile::default();
        assert_eq!(profile.user, SimulatedBehavior::new(Duration::from_millis(10), false));
        assert_eq!(profile.permissions.latency, Duration::from_millis(50));
        assert_eq!(profile.vector_memory.latency, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_services_answer_after_latency() {
        let caller = CancellationToken::new();
        let scope = DeadlineController::new(Duration::from_millis(200)).unwrap().start(&caller);
        let deps = SimulationProfile::default().build();

        let user = deps.user.get_user(scope.context(), "1").await.unwrap();
        assert_eq!(user.id, "1");

        let permissions = deps
            .permissions
            .check_access(scope.context(), "1", "42")
            .await
            .unwrap();
        assert_eq!((permissions.chat_id.as_str(), permissions.allowed), ("42", true));

        let context = deps.vector_memory.get_context(scope.context(), "42").await.unwrap();
        assert_eq!(context.source, "vector");
        assert!(context.latency_ms >= 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_failure_and_deadline() {
        let caller = CancellationToken::new();
        let scope = DeadlineController::new(Duration::from_millis(200)).unwrap().start(&caller);

        let failing = SimulatedUserService::new(SimulatedBehavior::new(Duration::ZERO, true));
        let err = failing.get_user(scope.context(), "1").await.unwrap_err();
        assert_eq!(err.to_string(), "user service error");

        let slow = SimulatedVectorMemory::new(SimulatedBehavior::new(Duration::from_secs(3), false));
        let err = slow.get_context(scope.context(), "42").await.unwrap_err();
        assert_eq!(err, DependencyError::Context(ContextError::DeadlineExceeded));
        assert!(scope.context().elapsed() < Duration::from_millis(210));
    }
}
