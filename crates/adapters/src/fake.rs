// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`AgentAdapter`] for tests, gated behind `test-support` so other
//! crates (`dispatchd-engine`, `dispatchd-daemon`) can depend on it without
//! pulling in `tonic`'s transport machinery for their own test suites.

use crate::error::AdapterError;
use crate::traits::{AgentAdapter, LogFrame, LogStream, VerificationOutcome};
use async_trait::async_trait;
use dispatchd_core::{AgentId, JobId, RepoId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Default)]
pub struct FakeAdapter {
    log_frames: Mutex<HashMap<JobId, Vec<LogFrame>>>,
    verification: Mutex<HashMap<JobId, VerificationOutcome>>,
    pr_links: Mutex<HashMap<JobId, String>>,
    unhealthy: Mutex<HashSet<AgentId>>,
    stalled: Mutex<HashSet<JobId>>,
    calls: Mutex<Vec<String>>,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program_logs(&self, job_id: JobId, frames: Vec<LogFrame>) {
        self.log_frames.lock().insert(job_id, frames);
    }

    pub fn program_verification(&self, job_id: JobId, outcome: VerificationOutcome) {
        self.verification.lock().insert(job_id, outcome);
    }

    pub fn program_pr_link(&self, job_id: JobId, link: impl Into<String>) {
        self.pr_links.lock().insert(job_id, link.into());
    }

    /// Makes `execute_job` for this job return a stream that never yields,
    /// for exercising the heartbeat-timeout cancel/retry path.
    pub fn stall_execute_job(&self, job_id: JobId) {
        self.stalled.lock().insert(job_id);
    }

    pub fn mark_unhealthy(&self, agent_id: AgentId) {
        self.unhealthy.lock().insert(agent_id);
    }

    pub fn mark_healthy(&self, agent_id: AgentId) {
        self.unhealthy.lock().remove(&agent_id);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

#[async_trait]
impl AgentAdapter for FakeAdapter {
    async fn execute_job(
        &self,
        _agent_id: AgentId,
        job_id: JobId,
        _prompt: String,
        _repo_id: Option<RepoId>,
        _details: String,
    ) -> Result<LogStream, AdapterError> {
        self.record(format!("execute_job:{job_id}"));
        if self.stalled.lock().contains(&job_id) {
            return Ok(Box::pin(futures_util::stream::pending()));
        }
        let frames = self.log_frames.lock().remove(&job_id).unwrap_or_else(|| {
            vec![LogFrame { level: "info".into(), timestamp_ms: 0, message: "job complete".into(), stage: None }]
        });
        let stream = futures_util::stream::iter(frames.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn cancel_job(&self, _agent_id: AgentId, job_id: JobId) -> Result<(), AdapterError> {
        self.record(format!("cancel_job:{job_id}"));
        Ok(())
    }

    async fn run_verification(&self, _agent_id: AgentId, job_id: JobId) -> Result<VerificationOutcome, AdapterError> {
        self.record(format!("run_verification:{job_id}"));
        Ok(self.verification.lock().get(&job_id).copied().unwrap_or(VerificationOutcome { success: true, confidence_score: 0.9 }))
    }

    async fn create_pr(
        &self,
        _agent_id: AgentId,
        job_id: JobId,
        _repo_id: RepoId,
        _branch: String,
        _title: String,
        _body: String,
    ) -> Result<String, AdapterError> {
        self.record(format!("create_pr:{job_id}"));
        Ok(self.pr_links.lock().get(&job_id).cloned().unwrap_or_else(|| format!("https://example.invalid/pr/{job_id}")))
    }

    async fn cleanup_workspace(&self, _agent_id: AgentId, job_id: JobId) -> Result<(), AdapterError> {
        self.record(format!("cleanup_workspace:{job_id}"));
        Ok(())
    }

    async fn health_check(&self, agent_id: AgentId) -> Result<(), AdapterError> {
        self.record(format!("health_check:{agent_id}"));
        if self.unhealthy.lock().contains(&agent_id) {
            Err(AdapterError::Timeout(std::time::Duration::from_secs(5)))
        } else {
            Ok(())
        }
    }
}

/// Convenience constructor matching the teacher's pattern of handing out a
/// shared fake from one place in test setup.
pub fn shared_fake() -> Arc<FakeAdapter> {
    Arc::new(FakeAdapter::new())
}
