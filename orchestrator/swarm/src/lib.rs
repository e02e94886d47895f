// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `hybrid-swarm-swarm` - Specialist and Signal Coordination
//!
//! Decides *who* handles a task and remembers *what worked* for it.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `TaskSignature`, `SpecialistProfile`, `Signal` and repository traits |
//! | [`application`] | Application | `SpecialistRegistry`, `SignalBoard`, `SignalSweeper` |
//! | [`infrastructure`] | Infrastructure | in-memory and JSON file repositories |
//!
//! ## Key Concepts
//!
//! - **Resonance**: cosine similarity between a task's signature vector and the
//!   centroid of a specialist's recent signatures, weighted by its success rate.
//! - **Vigilance**: the minimum resonance needed to reuse a specialist; below
//!   it a new specialist is created.
//! - **Signal**: a decaying strength linking a task to an approach, amplified
//!   by good or same-depositor outcomes and attenuated otherwise.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
