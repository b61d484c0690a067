// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-side view of the remote execution agent (§4.12/§4.6). Implemented
//! once over a `tonic` channel ([`crate::grpc::GrpcAgentAdapter`]) and once as
//! an in-memory fake for tests ([`crate::fake::FakeAdapter`]), mirroring the
//! teacher's `LocalAdapter`/`DockerAdapter` split behind one trait.

use crate::error::AdapterError;
use async_trait::async_trait;
use dispatchd_core::{AgentId, JobId, RepoId};
use futures_util::stream::Stream;
use std::pin::Pin;

/// One streamed line from `execute_job`/`run_verification`, piped into the
/// Log Sink (§4.9) as it arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFrame {
    pub level: String,
    pub timestamp_ms: i64,
    pub message: String,
    pub stage: Option<String>,
}

pub type LogStream = Pin<Box<dyn Stream<Item = Result<LogFrame, AdapterError>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerificationOutcome {
    pub success: bool,
    pub confidence_score: f32,
}

#[async_trait]
pub trait AgentAdapter: Send + Sync {
    /// Streaming activity per §4.6 step 1: initiates `ExecuteJob` and returns
    /// a stream of log frames as they arrive over the RPC.
    async fn execute_job(
        &self,
        agent_id: AgentId,
        job_id: JobId,
        prompt: String,
        repo_id: Option<RepoId>,
        details: String,
    ) -> Result<LogStream, AdapterError>;

    async fn cancel_job(&self, agent_id: AgentId, job_id: JobId) -> Result<(), AdapterError>;

    async fn run_verification(&self, agent_id: AgentId, job_id: JobId) -> Result<VerificationOutcome, AdapterError>;

    async fn create_pr(
        &self,
        agent_id: AgentId,
        job_id: JobId,
        repo_id: RepoId,
        branch: String,
        title: String,
        body: String,
    ) -> Result<String, AdapterError>;

    async fn cleanup_workspace(&self, agent_id: AgentId, job_id: JobId) -> Result<(), AdapterError>;

    /// One synchronous `HealthCheck` RPC (§4.7 step 2 / reconnect endpoint).
    async fn health_check(&self, agent_id: AgentId) -> Result<(), AdapterError>;
}
