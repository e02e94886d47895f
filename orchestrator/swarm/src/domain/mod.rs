// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Domain
//!
//! - [`specialist`] - `TaskSignature`, `SpecialistProfile`
//! - [`signal`] - `Signal`, `SignalReading`, `BoardState`
//! - [`repository`] - persistence contracts for both aggregates

pub mod repository;
pub mod signal;
pub mod specialist;

pub use repository::{SignalRepository, SpecialistRepository};
pub use signal::{BoardState, Signal, SignalReading};
pub use specialist::{SpecialistProfile, SpecialistStats, TaskSignature};
