// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Running and talking to the gateway

pub mod client;
pub mod server;

pub use client::{GatewayClient, SummaryOutcome};
