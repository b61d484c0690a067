// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent registry event handlers (§4.2, §4.7).

use super::MaterializedState;
use dispatchd_core::{Agent, AgentStatus, Event};

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::AgentRegistered { agent_id, org_id, name, host, port, ip, at_ms } => {
            state.agents_by_org_host.insert((*org_id, host.clone()), *agent_id);
            let entry = state.agents.entry(*agent_id).or_insert_with(|| Agent {
                id: *agent_id,
                org_id: *org_id,
                name: name.clone(),
                status: AgentStatus::Active,
                host: host.clone(),
                port: *port,
                ip: ip.clone(),
                consecutive_failures: 0,
                last_active_ms: Some(*at_ms),
                last_stream_connected_at_ms: Some(*at_ms),
                created_at_ms: *at_ms,
                updated_at_ms: *at_ms,
            });
            entry.name = name.clone();
            entry.host = host.clone();
            entry.port = *port;
            entry.ip = ip.clone();
            entry.status = AgentStatus::Active;
            entry.consecutive_failures = 0;
            entry.last_active_ms = Some(*at_ms);
            entry.last_stream_connected_at_ms = Some(*at_ms);
            entry.updated_at_ms = *at_ms;
        }

        Event::AgentHeartbeatReceived { agent_id, at_ms } => {
            if let Some(agent) = state.agents.get_mut(agent_id) {
                agent.last_active_ms = Some(*at_ms);
                agent.consecutive_failures = 0;
                agent.updated_at_ms = *at_ms;
            }
        }

        Event::AgentPingFailed { agent_id, at_ms } => {
            if let Some(agent) = state.agents.get_mut(agent_id) {
                agent.consecutive_failures += 1;
                agent.updated_at_ms = *at_ms;
            }
        }

        Event::AgentMarkedOffline { agent_id, at_ms } => {
            if let Some(agent) = state.agents.get_mut(agent_id) {
                agent.status = AgentStatus::Offline;
                agent.updated_at_ms = *at_ms;
            }
        }

        Event::AgentMarkedActive { agent_id, at_ms } => {
            if let Some(agent) = state.agents.get_mut(agent_id) {
                agent.status = AgentStatus::Active;
                agent.consecutive_failures = 0;
                agent.last_active_ms = Some(*at_ms);
                agent.updated_at_ms = *at_ms;
            }
        }

        Event::AgentStreamBound { agent_id, at_ms } => {
            if let Some(agent) = state.agents.get_mut(agent_id) {
                agent.last_stream_connected_at_ms = Some(*at_ms);
                agent.updated_at_ms = *at_ms;
            }
        }

        Event::AgentRemoved { agent_id } => {
            if let Some(agent) = state.agents.remove(agent_id) {
                state.agents_by_org_host.remove(&(agent.org_id, agent.host));
            }
        }

        _ => {}
    }
}
