// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health-Check Workflow (§4.7, C8). The actual `HEALTH_CHECK_PING`/
//! `HEARTBEAT` exchange happens over the agent's bound stream, which only
//! `dispatchd-daemon`'s stream manager has a handle to — this module is
//! generic over a [`Pinger`] so the daemon can supply that without the
//! engine crate depending on its transport layer.

use crate::error::RuntimeError;
use crate::schedule::ScheduleRegistry;
use async_trait::async_trait;
use dispatchd_core::{AgentId, AgentStatus, Clock};
use dispatchd_storage::Wal;
use std::time::Duration;

/// Sends `HEALTH_CHECK_PING` on an agent's bound stream and waits for the
/// acknowledging `HEARTBEAT`, or times out. Implemented by the daemon's
/// stream manager in production, by a programmable fake in tests.
#[async_trait]
pub trait Pinger: Send + Sync {
    async fn ping(&self, agent_id: AgentId, ack_timeout: Duration) -> Result<(), RuntimeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthCheckOutcome {
    pub success: bool,
}

/// Runs one §4.7 firing for `agent_id`.
pub async fn tick<C, W, P>(
    store: &dispatchd_storage::Store<C, W>,
    schedules: &ScheduleRegistry,
    pinger: &P,
    agent_id: AgentId,
    ack_timeout: Duration,
) -> Result<HealthCheckOutcome, RuntimeError>
where
    C: Clock,
    W: Wal,
    P: Pinger,
{
    let Some(agent) = store.get_agent(agent_id) else {
        return Err(dispatchd_storage::StoreError::AgentNotFound(agent_id.to_string()).into());
    };
    if agent.status != AgentStatus::Active {
        return Ok(HealthCheckOutcome { success: false });
    }

    match pinger.ping(agent_id, ack_timeout).await {
        Ok(()) => {
            store.heartbeat(agent_id)?;
            Ok(HealthCheckOutcome { success: true })
        }
        Err(_) => {
            let agent = store.ping_failed(agent_id)?;
            if agent.status == AgentStatus::Offline {
                schedules.pause(agent_id);
            }
            Ok(HealthCheckOutcome { success: false })
        }
    }
}

/// User-initiated reconnect endpoint (§4.7): one synchronous ping bypassing
/// the schedule, with its own (typically longer) timeout.
pub async fn reconnect<C, W, P>(
    store: &dispatchd_storage::Store<C, W>,
    schedules: &ScheduleRegistry,
    pinger: &P,
    agent_id: AgentId,
    ping_timeout: Duration,
    dispatch_interval: Duration,
    health_check_interval: Duration,
) -> Result<(), RuntimeError>
where
    C: Clock,
    W: Wal,
    P: Pinger,
{
    pinger.ping(agent_id, ping_timeout).await?;
    store.mark_active(agent_id)?;
    schedules.create_or_resume(agent_id, dispatch_interval, health_check_interval, || async {}, || async {});
    Ok(())
}
