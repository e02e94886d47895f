// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `hybrid-swarm-cortex`
//!
//! Learning half of the coordination engine: the catalog of approach
//! patterns, the execution ledger, and the discovery/evolution loop that
//! turns ledger history into new approaches.
//!
//! # Architecture
//!
//! - **Layer:** Learning & Memory Layer
//! - **Purpose:** Approach catalog, execution ledger, pattern mining and approach evolution

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
