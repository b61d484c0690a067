// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The write-ahead-log event type. Every durable mutation to
//! [`crate::job::Job`], [`crate::agent::Agent`], queue-pause state, and the
//! activity trail is represented as one `Event` variant. The persisted log is
//! the source of truth; `oj_storage::MaterializedState` is a replayable
//! projection over it.
//!
//! Handlers that apply these events must be idempotent: replaying the same
//! event twice must not change the result of replaying it once. Most
//! variants here set absolute values rather than relative deltas for
//! exactly that reason.

use crate::activity::Activity;
use crate::ids::{AgentId, JobId, OrgId, RepoId};
use crate::job::{Job, Priority, QueueType, UserAcceptanceStatus, UserInput};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Generation,
    Verification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // --- Agent lifecycle (C2, C8) ---
    #[serde(rename = "agent:registered")]
    AgentRegistered {
        agent_id: AgentId,
        org_id: OrgId,
        name: String,
        host: String,
        port: u16,
        ip: Option<String>,
        at_ms: u64,
    },
    #[serde(rename = "agent:heartbeat_received")]
    AgentHeartbeatReceived { agent_id: AgentId, at_ms: u64 },
    #[serde(rename = "agent:ping_failed")]
    AgentPingFailed { agent_id: AgentId, at_ms: u64 },
    #[serde(rename = "agent:marked_offline")]
    AgentMarkedOffline { agent_id: AgentId, at_ms: u64 },
    #[serde(rename = "agent:marked_active")]
    AgentMarkedActive { agent_id: AgentId, at_ms: u64 },
    #[serde(rename = "agent:stream_bound")]
    AgentStreamBound { agent_id: AgentId, at_ms: u64 },
    #[serde(rename = "agent:removed")]
    AgentRemoved { agent_id: AgentId },

    // --- Job creation / versioning (C1, C4) ---
    #[serde(rename = "job:created")]
    JobCreated { job: Box<Job> },
    #[serde(rename = "job:new_version_opened")]
    JobNewVersionOpened { job: Box<Job> },

    // --- Queue model (C4) ---
    #[serde(rename = "job:claimed")]
    JobClaimed { job_id: JobId, version: u32, agent_id: AgentId, at_ms: u64 },
    #[serde(rename = "job:orphaned")]
    JobOrphaned { job_id: JobId, version: u32, at_ms: u64 },
    #[serde(rename = "job:queue_position_set")]
    JobQueuePositionSet {
        job_id: JobId,
        version: u32,
        queue_type: Option<QueueType>,
        position: i64,
        at_ms: u64,
    },

    // --- Job status / review transitions (C5-C8, §4.8) ---
    #[serde(rename = "job:status_set")]
    JobStatusSet { job_id: JobId, version: u32, status: crate::job::JobStatus, at_ms: u64 },
    #[serde(rename = "job:acceptance_set")]
    JobAcceptanceSet { job_id: JobId, version: u32, acceptance: UserAcceptanceStatus, at_ms: u64 },
    #[serde(rename = "job:priority_set")]
    JobPrioritySet { job_id: JobId, version: u32, priority: Priority },
    #[serde(rename = "job:comment_added")]
    JobCommentAdded { job_id: JobId, version: u32, comment: String, at_ms: u64 },
    #[serde(rename = "job:pr_linked")]
    JobPrLinked { job_id: JobId, version: u32, pr_link: String, at_ms: u64 },
    #[serde(rename = "job:confidence_set")]
    JobConfidenceSet { job_id: JobId, version: u32, confidence_score: f32 },
    #[serde(rename = "job:log_appended")]
    JobLogAppended { job_id: JobId, version: u32, kind: LogKind, line: String },
    #[serde(rename = "job:logs_cleared")]
    JobLogsCleared { job_id: JobId, version: u32 },
    #[serde(rename = "job:update_appended")]
    JobUpdateAppended { job_id: JobId, version: u32, line: String, at_ms: u64 },
    #[serde(rename = "job:repo_set")]
    JobRepoSet { job_id: JobId, version: u32, repo_id: Option<RepoId> },
    #[serde(rename = "job:prompt_set")]
    JobPromptSet { job_id: JobId, version: u32, prompt: String },

    // --- Queue pause (C1) ---
    #[serde(rename = "queue:pause_set")]
    QueuePauseSet { org_id: OrgId, queue_type: QueueType, is_paused: bool },

    // --- Audit (C9 / §7) ---
    #[serde(rename = "activity:recorded")]
    ActivityRecorded { activity: Box<Activity> },

    /// Forward-compatibility catch-all so a newer writer's events don't
    /// break an older reader's WAL replay.
    #[serde(other, skip_serializing)]
    Unknown,
}

impl Event {
    /// Compact one-line summary for structured log fields.
    pub fn log_summary(&self) -> String {
        match self {
            Event::AgentRegistered { agent_id, .. } => format!("agent_registered({agent_id})"),
            Event::AgentHeartbeatReceived { agent_id, .. } => format!("agent_heartbeat({agent_id})"),
            Event::AgentPingFailed { agent_id, .. } => format!("agent_ping_failed({agent_id})"),
            Event::AgentMarkedOffline { agent_id, .. } => format!("agent_offline({agent_id})"),
            Event::AgentMarkedActive { agent_id, .. } => format!("agent_active({agent_id})"),
            Event::AgentStreamBound { agent_id, .. } => format!("agent_stream_bound({agent_id})"),
            Event::AgentRemoved { agent_id } => format!("agent_removed({agent_id})"),
            Event::JobCreated { job } => format!("job_created({})", job.id),
            Event::JobNewVersionOpened { job } => format!("job_new_version({}, v{})", job.id, job.version),
            Event::JobClaimed { job_id, agent_id, .. } => format!("job_claimed({job_id} -> {agent_id})"),
            Event::JobOrphaned { job_id, .. } => format!("job_orphaned({job_id})"),
            Event::JobQueuePositionSet { job_id, position, .. } => {
                format!("job_queue_position({job_id} -> {position})")
            }
            Event::JobStatusSet { job_id, status, .. } => format!("job_status({job_id} -> {status})"),
            Event::JobAcceptanceSet { job_id, acceptance, .. } => {
                format!("job_acceptance({job_id} -> {acceptance})")
            }
            Event::JobPrioritySet { job_id, priority, .. } => format!("job_priority({job_id} -> {priority})"),
            Event::JobCommentAdded { job_id, .. } => format!("job_comment({job_id})"),
            Event::JobPrLinked { job_id, .. } => format!("job_pr_linked({job_id})"),
            Event::JobConfidenceSet { job_id, .. } => format!("job_confidence({job_id})"),
            Event::JobLogAppended { job_id, kind, .. } => format!("job_log({job_id}, {kind:?})"),
            Event::JobLogsCleared { job_id, .. } => format!("job_logs_cleared({job_id})"),
            Event::JobUpdateAppended { job_id, .. } => format!("job_update({job_id})"),
            Event::JobRepoSet { job_id, .. } => format!("job_repo_set({job_id})"),
            Event::JobPromptSet { job_id, .. } => format!("job_prompt_set({job_id})"),
            Event::QueuePauseSet { org_id, queue_type, is_paused } => {
                format!("queue_pause({org_id}/{queue_type} -> {is_paused})")
            }
            Event::ActivityRecorded { activity } => format!("activity({})", activity.id),
            Event::Unknown => "unknown".to_string(),
        }
    }
}
