// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure adapters shared across the workspace.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Event streaming and JSON file persistence primitives

pub mod event_bus;
pub mod json_store;

pub use event_bus::{EventBus, EventBusError, EventReceiver};
