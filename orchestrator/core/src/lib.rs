// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `hybrid-swarm-core`
//!
//! Primitives shared by every crate in the coordination workspace.
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `TaskDescriptor`, `WeightMap`, similarity math, collaborator traits, `CoordinationEvent`, `CoordinationConfig`, `RepositoryError` |
//! | [`infrastructure`] | Infrastructure | broadcast `EventBus`, atomic JSON file helpers |

pub mod domain;
pub mod infrastructure;

pub use domain::*;
