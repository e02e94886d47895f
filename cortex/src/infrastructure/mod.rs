// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Storage implementations for approaches and execution records.

pub mod approach_repository;
pub mod ledger_store;

pub use approach_repository::{
    ApproachManifest, FileApproachRepository, InMemoryApproachRepository, ManifestEntry,
};
pub use ledger_store::{FileExecutionRecordStore, InMemoryExecutionRecordStore};
