// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Persistence contracts for the swarm bounded context.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `SpecialistRepository` | `SpecialistProfile` | `InMemorySpecialistRepository`, `FileSpecialistRepository` |
//! | `SignalRepository` | `Signal` (grouped by task) | `InMemorySignalRepository`, `FileSignalRepository` |

use async_trait::async_trait;
use hybrid_swarm_core::RepositoryError;

use super::signal::Signal;
use super::specialist::SpecialistProfile;

#[async_trait]
pub trait SpecialistRepository: Send + Sync {
    /// Save profile (create or update)
    async fn save(&self, profile: &SpecialistProfile) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<SpecialistProfile>, RepositoryError>;

    /// All profiles; corrupt entries are skipped by implementations
    async fn list_all(&self) -> Result<Vec<SpecialistProfile>, RepositoryError>;

    /// Hard delete; deleting a missing id is not an error
    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;
}

/// Signals are stored per task id.
#[async_trait]
pub trait SignalRepository: Send + Sync {
    /// Replace the stored signals of `task_id`. An empty slice removes the task.
    async fn save_task(&self, task_id: &str, signals: &[Signal]) -> Result<(), RepositoryError>;

    async fn load_all(&self) -> Result<Vec<Signal>, RepositoryError>;
}
