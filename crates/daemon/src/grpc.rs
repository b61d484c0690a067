// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend gRPC Surface (§4.12, §6): the `BackendService` agents speak to —
//! `RegisterAgent`, `HealthCheck`, and the bidirectional `AgentStream` that
//! carries heartbeats and log lines and fans out task assignments and
//! health-check pings.

use crate::auth::ApiKeyTable;
use dispatchd_adapters::GrpcAgentAdapter;
use dispatchd_core::{AgentId, AgentStatus, Clock, LogKind, OrgId};
use dispatchd_engine::Runtime;
use dispatchd_storage::Wal;
use dispatchd_wire::proto::backend_service_server::BackendService;
use dispatchd_wire::proto::{AgentStreamMessage, AgentStreamRequest, HealthCheckRequest, HealthResp, RegisterAgentRequest, RegisterAgentResponse};
use dispatchd_wire::Frame;
use futures_util::StreamExt;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tonic::{Request, Response, Status, Streaming};

const STREAM_BUFFER: usize = 64;

/// Applies one inbound `LOG_MESSAGE` frame (§4.3, §4.9). Drops the frame
/// silently when `job_id` doesn't resolve or belongs to a different org than
/// the streaming agent's own — an agent stream is never trusted to name jobs
/// outside its org. `stage` picks the log series the line is appended to,
/// falling back to the generation series when absent or unrecognized.
fn handle_log_message<C: Clock, W: Wal>(
    store: &dispatchd_storage::Store<C, W>,
    org_id: OrgId,
    job_id: dispatchd_core::JobId,
    level: &str,
    message: String,
    stage: Option<&str>,
) {
    let Some(job) = store.latest_job(job_id) else { return };
    if job.org_id != org_id {
        return;
    }
    let kind = match stage {
        Some("verification") => LogKind::Verification,
        _ => LogKind::Generation,
    };
    let line = if level.eq_ignore_ascii_case("error") { format!("[error] {message}") } else { message };
    let _ = store.append_log(job_id, kind, line);
}

/// Holds the concrete production collaborators rather than threading the
/// engine's `Runtime<C, W, A, P>` generics through tonic's codegen: agents
/// only ever dial the one live backend.
pub struct BackendServiceImpl<C: Clock, W: Wal> {
    runtime: Arc<Runtime<C, W, GrpcAgentAdapter, crate::stream::StreamManager>>,
    adapter: Arc<GrpcAgentAdapter>,
    stream: Arc<crate::stream::StreamManager>,
    api_keys: ApiKeyTable,
}

impl<C: Clock, W: Wal> BackendServiceImpl<C, W> {
    pub fn new(
        runtime: Arc<Runtime<C, W, GrpcAgentAdapter, crate::stream::StreamManager>>,
        adapter: Arc<GrpcAgentAdapter>,
        stream: Arc<crate::stream::StreamManager>,
        api_keys: ApiKeyTable,
    ) -> Self {
        Self { runtime, adapter, stream, api_keys }
    }
}

#[tonic::async_trait]
impl<C, W> BackendService for BackendServiceImpl<C, W>
where
    C: Clock + 'static,
    W: Wal + 'static,
{
    async fn register_agent(&self, request: Request<RegisterAgentRequest>) -> Result<Response<RegisterAgentResponse>, Status> {
        let req = request.into_inner();
        let org_id = self.api_keys.resolve(&req.api_key).ok_or_else(|| Status::unauthenticated("invalid credentials"))?;
        let port = u16::try_from(req.port).map_err(|_| Status::invalid_argument("port out of range"))?;

        let (agent, prior_status) = self
            .runtime
            .store()
            .register_agent(org_id, req.hostname.clone(), req.hostname.clone(), port, req.ip.clone())
            .map_err(|e| Status::internal(e.to_string()))?;

        self.adapter.set_endpoint(agent.id, req.hostname, port);
        if prior_status != AgentStatus::Active {
            self.runtime.start_agent(agent.id);
        }

        Ok(Response::new(RegisterAgentResponse {
            agent_id: agent.id.to_string(),
            org_id: agent.org_id.to_string(),
            success: true,
            message: "registered".to_string(),
        }))
    }

    async fn health_check(&self, request: Request<HealthCheckRequest>) -> Result<Response<HealthResp>, Status> {
        let agent_id = AgentId::from(request.into_inner().agent_id.as_str());
        let agent = self.runtime.store().mark_active(agent_id).map_err(|e| Status::not_found(e.to_string()))?;
        let timestamp_ms = agent.last_active_ms.and_then(|ms| i64::try_from(ms).ok()).unwrap_or(0);
        Ok(Response::new(HealthResp { success: true, timestamp_ms, version: env!("CARGO_PKG_VERSION").to_string() }))
    }

    type AgentStreamStream = Pin<Box<dyn Stream<Item = Result<AgentStreamMessage, Status>> + Send + 'static>>;

    async fn agent_stream(&self, request: Request<Streaming<AgentStreamRequest>>) -> Result<Response<Self::AgentStreamStream>, Status> {
        let mut inbound = request.into_inner();
        let (tx, rx): (tokio::sync::mpsc::Sender<Result<AgentStreamMessage, Status>>, tokio::sync::mpsc::Receiver<Result<AgentStreamMessage, Status>>) =
            tokio::sync::mpsc::channel(STREAM_BUFFER);

        let store = self.runtime.store().clone();
        let stream_manager = self.stream.clone();
        let mut bound_agent: Option<(AgentId, OrgId)> = None;

        tokio::spawn(async move {
            while let Some(item) = inbound.next().await {
                let wire = match item {
                    Ok(wire) => wire,
                    Err(_) => break,
                };
                let frame = match Frame::try_from(wire) {
                    Ok(frame) => frame,
                    Err(_) => continue,
                };
                match frame {
                    Frame::Init { agent_id } => {
                        let org_id = match store.get_agent(agent_id) {
                            Some(agent) => agent.org_id,
                            None => break,
                        };
                        stream_manager.register(agent_id, org_id, tx.clone());
                        if store.bind_stream(agent_id).is_err() {
                            break;
                        }
                        bound_agent = Some((agent_id, org_id));
                    }
                    Frame::Heartbeat => {
                        if let Some((agent_id, _)) = bound_agent {
                            let _ = store.heartbeat(agent_id);
                            stream_manager.acknowledge_ping(agent_id);
                        }
                    }
                    Frame::LogMessage { job_id, level, timestamp_ms: _, message, stage } => {
                        if let Some((_, org_id)) = bound_agent {
                            handle_log_message(&store, org_id, job_id, &level, message, stage.as_deref());
                        }
                    }
                }
            }
            if let Some((agent_id, _)) = bound_agent {
                stream_manager.unregister(agent_id);
            }
        });

        let out = ReceiverStream::new(rx);
        Ok(Response::new(Box::pin(out) as Self::AgentStreamStream))
    }
}
