// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent registry row — a remote execution process bound to one org.

use crate::ids::{AgentId, OrgId};
use serde::{Deserialize, Serialize};

/// Liveness state of a registered agent.
///
/// `consecutive_failures` is always `0` while `status = Active` — callers
/// that flip `status` must zero the counter in the same mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    Idle,
    Offline,
}

crate::simple_display! {
    AgentStatus {
        Active => "active",
        Idle => "idle",
        Offline => "offline",
    }
}

/// Threshold of consecutive failed health-check pings before an agent is
/// marked `offline` and its schedules are paused.
pub const OFFLINE_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub org_id: OrgId,
    pub name: String,
    pub status: AgentStatus,
    pub host: String,
    pub port: u16,
    pub ip: Option<String>,
    pub consecutive_failures: u32,
    pub last_active_ms: Option<u64>,
    pub last_stream_connected_at_ms: Option<u64>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Agent {
    /// True once three consecutive pings have failed — the caller is
    /// responsible for then setting `status = Offline`.
    pub fn should_go_offline(&self) -> bool {
        self.consecutive_failures >= OFFLINE_THRESHOLD
    }

    crate::setters! {
        into { name: String }
        set { port: u16 }
        option { ip: String }
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct AgentBuilder => Agent {
        computed { id: AgentId = AgentId::new() }
        into { org_id: OrgId = OrgId::new() }
        into { name: String = "agent-1" }
        set { status: AgentStatus = AgentStatus::Offline }
        into { host: String = "127.0.0.1" }
        set { port: u16 = 7700 }
        option { ip: String = None }
        set { consecutive_failures: u32 = 0 }
        option { last_active_ms: u64 = None }
        option { last_stream_connected_at_ms: u64 = None }
        set { created_at_ms: u64 = 0 }
        set { updated_at_ms: u64 = 0 }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
