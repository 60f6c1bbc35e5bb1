// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Scatter-gather CLI library - exposes testable components
//!
//! - `commands`: clap subcommands and their handlers
//! - `gateway`: HTTP server bootstrap and the client for a running gateway

pub mod commands;
pub mod gateway;
