// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage-boundary error type and its classification (§7).

use thiserror::Error;

/// Classifies a [`StoreError`] into the policy buckets named in §7, so
/// REST/gRPC boundary code can map uniformly to status codes without
/// matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    Io,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    JobNotFound(String),
    #[error("agent {0} not found")]
    AgentNotFound(String),
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    #[error("wal write failed: {0}")]
    Wal(#[source] std::io::Error),
    #[error("wal entry corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::JobNotFound(_) | StoreError::AgentNotFound(_) => ErrorKind::NotFound,
            StoreError::InvalidTransition(_) => ErrorKind::InvalidTransition,
            StoreError::Wal(_) | StoreError::Corrupt(_) => ErrorKind::Io,
        }
    }
}
