// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Deadline Controller
//!
//! Derives the bounded execution window every aggregation runs in. The
//! window closes at `min(caller cancellation, start + SLA)` and, once closed,
//! stays closed. Dependency calls and the fan-in loop all observe the same
//! [`ExecutionContext`].
//!
//! Closing is cooperative: the context only signals. Dependencies are
//! expected to watch [`ExecutionContext::done`] (or use
//! [`ExecutionContext::sleep`]) and return promptly.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Why an execution context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("context cancelled")]
    Cancelled,
}

/// Invalid construction parameters for the aggregation core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("SLA must be greater than zero")]
    ZeroSla,
    #[error("SLA is too large to compute a deadline")]
    SlaTooLarge,
}

/// Bounded execution context shared by one aggregation.
///
/// Cheap to clone; all clones observe the same deadline and cancellation.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    token: CancellationToken,
    caller: CancellationToken,
    started_at: Instant,
    deadline: Instant,
}

impl ExecutionContext {
    /// Resolves once the context is done, either because the deadline passed
    /// or because the context was cancelled.
    pub async fn done(&self) {
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = sleep_until(self.deadline) => {}
        }
    }

    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || Instant::now() >= self.deadline
    }

    /// Reason the context is done, or `None` while it is still open.
    ///
    /// Caller cancellation is reported as [`ContextError::Cancelled`] even
    /// when the deadline has since passed.
    pub fn err(&self) -> Option<ContextError> {
        if self.caller.is_cancelled() {
            Some(ContextError::Cancelled)
        } else if Instant::now() >= self.deadline {
            Some(ContextError::DeadlineExceeded)
        } else if self.token.is_cancelled() {
            Some(ContextError::Cancelled)
        } else {
            None
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Waits for `duration` unless the context finishes first.
    ///
    /// A zero duration returns immediately without consulting the context.
    pub async fn sleep(&self, duration: Duration) -> Result<(), ContextError> {
        if duration.is_zero() {
            return Ok(());
        }

        tokio::select! {
            biased;
            _ = self.done() => Err(self.err().unwrap_or(ContextError::DeadlineExceeded)),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

/// Fallback deadline offset when `start + SLA` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Derives execution contexts with a fixed SLA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineController {
    sla: Duration,
}

impl DeadlineController {
    pub fn new(sla: Duration) -> Result<Self, ConfigError> {
        if sla.is_zero() {
            return Err(ConfigError::ZeroSla);
        }
        if Instant::now().checked_add(sla).is_none() {
            return Err(ConfigError::SlaTooLarge);
        }
        Ok(Self { sla })
    }

    pub fn sla(&self) -> Duration {
        self.sla
    }

    /// Opens a new window bound to the caller's cancellation token.
    ///
    /// The returned scope cancels the context when dropped, which is how
    /// outstanding dependency calls learn that the aggregation is over.
    pub fn start(&self, caller: &CancellationToken) -> DeadlineScope {
        let started_at = Instant::now();
        // `new` bounds the SLA; saturate rather than panic if the clock moved that far
        let deadline = started_at
            .checked_add(self.sla)
            .or_else(|| started_at.checked_add(FAR_FUTURE))
            .unwrap_or(started_at);
        let token = caller.child_token();
        let context = ExecutionContext {
            token: token.clone(),
            caller: caller.clone(),
            started_at,
            deadline,
        };

        DeadlineScope {
            context,
            _guard: token.drop_guard(),
        }
    }
}

/// Owns one execution window. Dropping it closes the window.
#[derive(Debug)]
pub struct DeadlineScope {
    context: ExecutionContext,
    _guard: DropGuard,
}

impl DeadlineScope {
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }
}
