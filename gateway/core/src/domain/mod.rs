// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! Types and contracts shared by every aggregation: the execution context and
//! its deadline, the dependency contract, per-dependency outcomes and the
//! terminal aggregation result.

pub mod aggregation;
pub mod chat;
pub mod deadline;
pub mod dependency;
pub mod gateway_config;
