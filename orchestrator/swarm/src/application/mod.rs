// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Swarm application services.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Specialist matching, signal reinforcement and the background sweep

pub mod registry;
pub mod signal_board;
pub mod signal_sweeper;

pub use registry::{SpecialistMatch, SpecialistRegistry};
pub use signal_board::SignalBoard;
pub use signal_sweeper::{SignalSweeper, SignalSweeperConfig};
