// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter-boundary error type and its classification (§7).

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidCredentials,
    Transient,
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("agent not found: {0}")]
    AgentNotFound(String),
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("agent stream rpc failed: {0}")]
    Rpc(#[source] tonic::Status),
    #[error("agent did not respond within {0:?}")]
    Timeout(std::time::Duration),
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::AgentNotFound(_) => ErrorKind::NotFound,
            AdapterError::JobNotFound(_) => ErrorKind::NotFound,
            AdapterError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AdapterError::Rpc(_) | AdapterError::Timeout(_) => ErrorKind::Transient,
        }
    }

    /// §4.6's activity retry policy treats these three causes as non-retriable.
    pub fn is_retriable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::NotFound | ErrorKind::InvalidCredentials)
    }
}
