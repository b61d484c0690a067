// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::AdapterError;
use crate::traits::{AgentAdapter, LogFrame, LogStream, VerificationOutcome};
use async_trait::async_trait;
use dispatchd_core::{AgentId, JobId, RepoId};
use dispatchd_wire::proto::agent_service_client::AgentServiceClient;
use dispatchd_wire::proto::{
    CancelJobRequest, CleanupWorkspaceRequest, CreatePrRequest, ExecuteJobRequest, HealthCheckRequest, RunVerificationRequest,
};
use futures_util::StreamExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use tonic::transport::{Channel, Endpoint};
use tonic::Request;

/// Agent adapter that speaks to the remote execution agent over the
/// `AgentService` gRPC surface (§4.12/§6). Channels are connected lazily and
/// cached per agent, keyed by the `host:port` the agent registered with.
#[derive(Clone, Default)]
pub struct GrpcAgentAdapter {
    endpoints: std::sync::Arc<Mutex<HashMap<AgentId, String>>>,
    channels: std::sync::Arc<Mutex<HashMap<AgentId, Channel>>>,
}

impl GrpcAgentAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or updates) the endpoint an agent answers `ExecuteJob`/etc on.
    /// Called by the daemon after `register_agent`/`AgentRegistered` so later
    /// dispatch doesn't need to thread host/port through every call site.
    pub fn set_endpoint(&self, agent_id: AgentId, host: impl Into<String>, port: u16) {
        self.endpoints.lock().insert(agent_id, format!("http://{}:{}", host.into(), port));
        self.channels.lock().remove(&agent_id);
    }

    pub fn remove_endpoint(&self, agent_id: AgentId) {
        self.endpoints.lock().remove(&agent_id);
        self.channels.lock().remove(&agent_id);
    }

    fn channel_for(&self, agent_id: AgentId) -> Result<Channel, AdapterError> {
        if let Some(channel) = self.channels.lock().get(&agent_id) {
            return Ok(channel.clone());
        }
        let uri = self.endpoints.lock().get(&agent_id).cloned().ok_or_else(|| AdapterError::AgentNotFound(agent_id.to_string()))?;
        let endpoint = Endpoint::from_shared(uri).map_err(|e| AdapterError::Rpc(tonic::Status::invalid_argument(e.to_string())))?;
        let channel = endpoint.connect_lazy();
        self.channels.lock().insert(agent_id, channel.clone());
        Ok(channel)
    }

    fn client_for(&self, agent_id: AgentId) -> Result<AgentServiceClient<Channel>, AdapterError> {
        Ok(AgentServiceClient::new(self.channel_for(agent_id)?))
    }
}

#[async_trait]
impl AgentAdapter for GrpcAgentAdapter {
    async fn execute_job(
        &self,
        agent_id: AgentId,
        job_id: JobId,
        prompt: String,
        repo_id: Option<RepoId>,
        details: String,
    ) -> Result<LogStream, AdapterError> {
        let mut client = self.client_for(agent_id)?;
        let request = ExecuteJobRequest { job_id: job_id.to_string(), prompt, repo_id: repo_id.map(|r| r.to_string()), details };
        let stream = client.execute_job(Request::new(request)).await.map_err(AdapterError::Rpc)?.into_inner();
        let mapped = stream.map(|item| {
            item.map(|log| LogFrame { level: log.level, timestamp_ms: log.timestamp_ms, message: log.message, stage: log.stage })
                .map_err(AdapterError::Rpc)
        });
        Ok(Box::pin(mapped))
    }

    async fn cancel_job(&self, agent_id: AgentId, job_id: JobId) -> Result<(), AdapterError> {
        let mut client = self.client_for(agent_id)?;
        client.cancel_job(Request::new(CancelJobRequest { job_id: job_id.to_string() })).await.map_err(AdapterError::Rpc)?;
        Ok(())
    }

    async fn run_verification(&self, agent_id: AgentId, job_id: JobId) -> Result<VerificationOutcome, AdapterError> {
        let mut client = self.client_for(agent_id)?;
        let resp = client
            .run_verification(Request::new(RunVerificationRequest { job_id: job_id.to_string() }))
            .await
            .map_err(AdapterError::Rpc)?
            .into_inner();
        Ok(VerificationOutcome { success: resp.success, confidence_score: resp.confidence_score })
    }

    async fn create_pr(
        &self,
        agent_id: AgentId,
        job_id: JobId,
        repo_id: RepoId,
        branch: String,
        title: String,
        body: String,
    ) -> Result<String, AdapterError> {
        let mut client = self.client_for(agent_id)?;
        let request = CreatePrRequest { job_id: job_id.to_string(), repo_id: repo_id.to_string(), branch, title, body };
        let resp = client.create_pr(Request::new(request)).await.map_err(AdapterError::Rpc)?.into_inner();
        Ok(resp.pr_link)
    }

    async fn cleanup_workspace(&self, agent_id: AgentId, job_id: JobId) -> Result<(), AdapterError> {
        let mut client = self.client_for(agent_id)?;
        client
            .cleanup_workspace(Request::new(CleanupWorkspaceRequest { job_id: job_id.to_string() }))
            .await
            .map_err(AdapterError::Rpc)?;
        Ok(())
    }

    async fn health_check(&self, agent_id: AgentId) -> Result<(), AdapterError> {
        let mut client = self.client_for(agent_id)?;
        let resp = client
            .health_check(Request::new(HealthCheckRequest { agent_id: agent_id.to_string() }))
            .await
            .map_err(AdapterError::Rpc)?
            .into_inner();
        if resp.success {
            Ok(())
        } else {
            Err(AdapterError::Rpc(tonic::Status::unavailable("agent reported unhealthy")))
        }
    }
}
