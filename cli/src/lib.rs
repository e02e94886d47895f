// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Hybrid swarm coordination engine and its CLI commands.
//!
//! # Architecture
//!
//! - **Layer:** Application / Presentation Layer
//! - **Purpose:** Composes the swarm and cortex crates into the
//!   [`CoordinationEngine`](engine::CoordinationEngine) and exposes it on the
//!   command line

pub mod bootstrap;
pub mod commands;
pub mod discovery;
pub mod engine;

pub use bootstrap::{build_engine, CoordinationRuntime};
pub use engine::{
    CoordinationDecision, CoordinationEngine, EngineError, ExecutionReport, RecordOutcome,
    SelectionSource, SystemStats,
};
