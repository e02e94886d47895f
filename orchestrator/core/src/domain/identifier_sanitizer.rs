// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Identifier Sanitizer Domain Service
//!
//! Identifiers arriving from callers (task ids, approach ids, specialist ids)
//! end up as file names in the file-backed stores. Every store routes them
//! through an injected [`IdentifierSanitizer`] so no caller-controlled string
//! can escape the storage root.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Traversal-safe identifier normalization at the storage boundary

use std::path::{Component, Path};
use thiserror::Error;

/// Identifier sanitization errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SanitizerError {
    #[error("Identifier is empty after sanitization: {0:?}")]
    Empty(String),

    #[error("Identifier contains a null byte")]
    NullByte,
}

/// Normalizes raw identifiers into values that are safe to use as file stems.
pub trait IdentifierSanitizer: Send + Sync {
    fn sanitize(&self, raw: &str) -> Result<String, SanitizerError>;
}

/// Default sanitizer
///
/// - Drops every path component except the last (rejects `../` escapes)
/// - Keeps ASCII alphanumerics, `_` and `-`
/// - Truncates to `max_len` characters
#[derive(Debug, Clone)]
pub struct StrictIdentifierSanitizer {
    max_len: usize,
}

impl StrictIdentifierSanitizer {
    pub fn new() -> Self {
        Self { max_len: 100 }
    }

    pub fn with_max_length(max_len: usize) -> Self {
        Self { max_len }
    }
}

impl Default for StrictIdentifierSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierSanitizer for StrictIdentifierSanitizer {
    fn sanitize(&self, raw: &str) -> Result<String, SanitizerError> {
        if raw.contains('\0') {
            tracing::warn!("Identifier contains null byte");
            return Err(SanitizerError::NullByte);
        }

        let last = Path::new(raw)
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .last()
            .unwrap_or("");

        let cleaned: String = last
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .take(self.max_len)
            .collect();

        if cleaned.is_empty() {
            tracing::warn!(raw = %raw, "Identifier rejected by sanitizer");
            return Err(SanitizerError::Empty(raw.to_string()));
        }
        if cleaned != raw {
            tracing::debug!(raw = %raw, sanitized = %cleaned, "Identifier sanitized");
        }
        Ok(cleaned)
    }
}
