// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent Stream Manager (§4.3, C3): the process-local registry binding each
//! connected agent's bidirectional `AgentStream` to its `AgentId`, grounded
//! on the teacher's `RemoteAgent`/`RemoteCoopClient` registry shape
//! (`Arc<Mutex<HashMap<AgentId, Session>>>`) per SPEC_FULL §4.3's
//! realization note.

use async_trait::async_trait;
use dispatchd_core::{AgentId, OrgId};
use dispatchd_engine::{Pinger, RuntimeError};
use dispatchd_wire::proto::AgentStreamMessage;
use dispatchd_wire::OutboundFrame;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tonic::Status;

struct StreamSession {
    org_id: OrgId,
    tx: mpsc::Sender<Result<AgentStreamMessage, Status>>,
}

/// Binds one agent at a time to its outbound sender half and tracks any
/// `HEALTH_CHECK_PING` awaiting an acknowledging `HEARTBEAT`.
#[derive(Default)]
pub struct StreamManager {
    sessions: Mutex<HashMap<AgentId, StreamSession>>,
    pending_pings: Mutex<HashMap<AgentId, oneshot::Sender<()>>>,
}

impl StreamManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `agent_id`'s stream; a pre-existing session for the same agent
    /// is dropped, which closes its channel (§4.3's "prior channel is
    /// closed" rule).
    pub fn register(&self, agent_id: AgentId, org_id: OrgId, tx: mpsc::Sender<Result<AgentStreamMessage, Status>>) {
        self.sessions.lock().insert(agent_id, StreamSession { org_id, tx });
    }

    pub fn unregister(&self, agent_id: AgentId) {
        self.sessions.lock().remove(&agent_id);
        self.pending_pings.lock().remove(&agent_id);
    }

    pub fn org_of(&self, agent_id: AgentId) -> Option<OrgId> {
        self.sessions.lock().get(&agent_id).map(|s| s.org_id)
    }

    pub fn is_connected(&self, agent_id: AgentId) -> bool {
        self.sessions.lock().contains_key(&agent_id)
    }

    async fn write(&self, agent_id: AgentId, frame: OutboundFrame) -> Result<(), RuntimeError> {
        let tx = self.sessions.lock().get(&agent_id).map(|s| s.tx.clone());
        let Some(tx) = tx else {
            return Err(RuntimeError::Timeout(Duration::ZERO));
        };
        tx.send(Ok(frame.into())).await.map_err(|_| RuntimeError::Timeout(Duration::ZERO))
    }

    /// Called by the stream handler (`grpc.rs`) when an inbound `HEARTBEAT`
    /// arrives: completes any outstanding ping wait for that agent.
    pub fn acknowledge_ping(&self, agent_id: AgentId) {
        if let Some(tx) = self.pending_pings.lock().remove(&agent_id) {
            let _ = tx.send(());
        }
    }
}

#[async_trait]
impl Pinger for StreamManager {
    async fn ping(&self, agent_id: AgentId, ack_timeout: Duration) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.pending_pings.lock().insert(agent_id, tx);
        self.write(agent_id, OutboundFrame::HealthCheckPing).await?;
        match tokio::time::timeout(ack_timeout, rx).await {
            Ok(Ok(())) => Ok(()),
            _ => {
                self.pending_pings.lock().remove(&agent_id);
                Err(RuntimeError::Timeout(ack_timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatchd_wire::proto::agent_stream_message::Frame as WireFrame;
    use std::sync::Arc;

    #[tokio::test]
    async fn ping_times_out_when_no_session_is_registered() {
        let manager = StreamManager::new();
        let result = manager.ping(AgentId::new(), Duration::from_millis(10)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn ping_resolves_once_acknowledged() {
        let manager = Arc::new(StreamManager::new());
        let agent_id = AgentId::new();
        let (tx, mut rx) = mpsc::channel(4);
        manager.register(agent_id, OrgId::new(), tx);

        let ping_manager = manager.clone();
        let handle = tokio::spawn(async move { ping_manager.ping(agent_id, Duration::from_millis(200)).await });

        let sent = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await.unwrap().unwrap().unwrap();
        assert!(matches!(sent.frame, Some(WireFrame::HealthCheckPing(_))));
        manager.acknowledge_ping(agent_id);

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn unregister_drops_the_session() {
        let manager = StreamManager::new();
        let agent_id = AgentId::new();
        let (tx, _rx) = mpsc::channel(4);
        manager.register(agent_id, OrgId::new(), tx);
        assert!(manager.is_connected(agent_id));

        manager.unregister(agent_id);
        assert!(!manager.is_connected(agent_id));
    }
}
