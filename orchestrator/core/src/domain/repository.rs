// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Plumbing
//!
//! Shared error type and storage backend selection for every repository in
//! the workspace. Each aggregate defines its own repository trait next to the
//! aggregate (specialists and signals in `hybrid-swarm-swarm`, approaches and
//! execution records in `hybrid-swarm-cortex`); all of them report failures
//! through [`RepositoryError`].
//!
//! ## Storage Backend Abstraction
//!
//! Concrete implementations are selected at startup from configuration.
//! In-memory implementations are used for tests and ephemeral runs; JSON
//! file-backed implementations for durable state.

use std::path::PathBuf;

use super::identifier_sanitizer::SanitizerError;

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    InMemory,
    FileSystem(FileSystemConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] SanitizerError),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        RepositoryError::Storage(err.to_string())
    }
}
