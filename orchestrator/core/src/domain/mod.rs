// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Shared domain vocabulary for the coordination engine.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Task descriptors, weight maps, similarity math, collaborator
//!   contracts, events, configuration and repository errors

pub mod collaborators;
pub mod config;
pub mod events;
pub mod identifier_sanitizer;
pub mod repository;
pub mod similarity;
pub mod task;
pub mod weights;

pub use collaborators::{ContentAnalyzer, ContentFeatures, DescriptorExtractor};
pub use config::CoordinationConfig;
pub use events::CoordinationEvent;
pub use identifier_sanitizer::{IdentifierSanitizer, SanitizerError, StrictIdentifierSanitizer};
pub use repository::{FileSystemConfig, RepositoryError, StorageBackend};
pub use task::TaskDescriptor;
pub use weights::WeightMap;
