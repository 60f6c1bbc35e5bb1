// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application Layer
//!
//! The aggregation pipeline (dispatch, fan-in, assembly) and the chat
//! summary use case built on top of it.

pub mod assembler;
pub mod chat_summary;
pub mod fan_in;
pub mod fan_out;
pub mod scatter_gather;
