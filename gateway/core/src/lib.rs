// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Scatter-Gather Core
//!
//! Deadline-bounded fan-out/fan-in aggregation for the chat-summary gateway.
//!
//! # Architecture
//!
//! - **Domain:** dependency contracts, execution context, aggregation results
//! - **Application:** fan-out dispatcher, fan-in aggregator, response assembler
//! - **Infrastructure:** simulated downstream dependencies
//! - **Presentation:** HTTP surface (Axum)

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
