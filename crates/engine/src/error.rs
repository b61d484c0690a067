// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-boundary error type (§7): wraps the two crates it orchestrates
//! over (`dispatchd-storage`, `dispatchd-adapters`) plus its own
//! orchestration-level failures (forbidden transitions, activity timeouts).

use dispatchd_adapters::AdapterError;
use dispatchd_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    Transient,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error("forbidden transition: {0}")]
    ForbiddenTransition(String),
    #[error("activity timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("{0}")]
    ActivityFailed(String),
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::Store(e) => match e.kind() {
                dispatchd_storage::ErrorKind::NotFound => ErrorKind::NotFound,
                dispatchd_storage::ErrorKind::InvalidTransition => ErrorKind::InvalidTransition,
                dispatchd_storage::ErrorKind::Io => ErrorKind::Transient,
            },
            RuntimeError::Adapter(e) => match e.kind() {
                dispatchd_adapters::ErrorKind::NotFound => ErrorKind::NotFound,
                dispatchd_adapters::ErrorKind::InvalidCredentials => ErrorKind::InvalidTransition,
                dispatchd_adapters::ErrorKind::Transient => ErrorKind::Transient,
            },
            RuntimeError::ForbiddenTransition(_) => ErrorKind::InvalidTransition,
            RuntimeError::Timeout(_) => ErrorKind::Transient,
            RuntimeError::ActivityFailed(_) => ErrorKind::InvalidTransition,
        }
    }

    /// §4.6's retry policy: non-retriable on "job not found", "invalid
    /// credentials", "agent not found" — all surface here as `NotFound` or
    /// `InvalidTransition` (credentials).
    pub fn is_retriable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transient)
    }
}
