// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application services of the approach learning layer.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Catalog, ledger, discovery and approach lifecycle

pub mod catalog;
pub mod evolver;
pub mod ledger;
pub mod legacy;
pub mod miner;

pub use catalog::{ApproachCatalog, CatalogError, CatalogStatistics};
pub use evolver::{ApproachEvolver, PruneCandidate, PruneReason};
pub use ledger::{ExecutionLedger, LedgerQuery};
pub use legacy::legacy_approaches;
pub use miner::{check_novelty, extract_signature, extract_style, DiscoveryReport, PatternMiner};
