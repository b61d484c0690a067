// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job domain type.
//!
//! A job is a versioned record keyed by `(id, version)`. Mutations normally
//! update the latest version in place; [`Job::needs_new_version`] names the
//! four cases that instead insert a fresh version row.

use crate::ids::{AgentId, JobId, OrgId, RepoId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    InProgress,
    InReview,
    Completed,
    Failed,
    Archived,
}

crate::simple_display! {
    JobStatus {
        Queued => "queued",
        InProgress => "in-progress",
        InReview => "in-review",
        Completed => "completed",
        Failed => "failed",
        Archived => "archived",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Archived)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

crate::simple_display! {
    Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// One of the two live queues. `queue_type = none` in the spec is modeled as
/// `Option<QueueType> = None` on [`Job`] rather than as a third variant here,
/// since "not queued" carries no ordering semantics of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueType {
    /// Fresh work, FIFO.
    Backlog,
    /// User-requested revision. Strictly prioritized over `Backlog`.
    Rework,
}

crate::simple_display! {
    QueueType {
        Backlog => "backlog",
        Rework => "rework",
    }
}

impl QueueType {
    pub const ALL: [QueueType; 2] = [QueueType::Rework, QueueType::Backlog];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAcceptanceStatus {
    NotReviewed,
    ReviewedAndAccepted,
    ReviewedAndAskedRework,
    Rejected,
}

crate::simple_display! {
    UserAcceptanceStatus {
        NotReviewed => "not_reviewed",
        ReviewedAndAccepted => "reviewed_and_accepted",
        ReviewedAndAskedRework => "reviewed_and_asked_rework",
        Rejected => "rejected",
    }
}

impl Default for UserAcceptanceStatus {
    fn default() -> Self {
        UserAcceptanceStatus::NotReviewed
    }
}

/// The prompt that seeded the job, and where it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInput {
    pub source: String,
    pub prompt: String,
    #[serde(default)]
    pub source_metadata: serde_json::Value,
}

/// Sentinel for "not queued", per the data-model invariant
/// `order_in_queue = -1 when not queued`.
pub const NOT_QUEUED: i64 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub version: u32,
    pub org_id: OrgId,
    pub status: JobStatus,
    pub priority: Priority,
    pub queue_type: Option<QueueType>,
    pub order_in_queue: i64,
    pub agent_id: Option<AgentId>,
    pub user_input: UserInput,
    pub repo_id: Option<RepoId>,
    pub user_acceptance_status: UserAcceptanceStatus,
    pub user_comments: Vec<String>,
    pub code_generation_logs: Option<String>,
    pub code_verification_logs: Option<String>,
    pub pr_link: Option<String>,
    pub confidence_score: Option<f32>,
    /// Append-only, human-readable, newline-separated audit trail.
    pub updates: String,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    pub created_by: String,
    pub updated_by: String,
}

impl Job {
    pub fn new(id: JobId, org_id: OrgId, user_input: UserInput, created_by: String, now_ms: u64) -> Self {
        Self {
            id,
            version: 1,
            org_id,
            status: JobStatus::Queued,
            priority: Priority::Medium,
            queue_type: None,
            order_in_queue: NOT_QUEUED,
            agent_id: None,
            user_input,
            repo_id: None,
            user_acceptance_status: UserAcceptanceStatus::NotReviewed,
            user_comments: Vec::new(),
            code_generation_logs: None,
            code_verification_logs: None,
            pr_link: None,
            confidence_score: None,
            updates: String::new(),
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            updated_by: created_by.clone(),
            created_by,
        }
    }

    pub fn is_queued(&self) -> bool {
        self.status == JobStatus::Queued && self.queue_type.is_some()
    }

    /// Versioning rule (§3): a new version row is opened when the prompt
    /// changes, the repo changes, acceptance transitions to
    /// `reviewed_and_asked_rework`, or a retry is requested. Any other PUT
    /// updates the latest version in place.
    pub fn needs_new_version(prompt_changed: bool, repo_changed: bool, acceptance_to_rework: bool, retry_requested: bool) -> bool {
        prompt_changed || repo_changed || acceptance_to_rework || retry_requested
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Append a timestamped, human-readable line to the audit trail.
    pub fn append_update(&mut self, now_ms: u64, line: &str) {
        if !self.updates.is_empty() {
            self.updates.push('\n');
        }
        self.updates.push_str(&format!("[{}] {}", crate::time_fmt::epoch_ms_to_rfc3339(now_ms), line));
    }

    /// Clears the per-version log series — used when a retry opens a new
    /// version (P7: a retry's new version starts with empty logs).
    pub fn clear_logs(&mut self) {
        self.code_generation_logs = None;
        self.code_verification_logs = None;
    }

    crate::setters! {
        set { priority: Priority }
        set { status: JobStatus }
        option { repo_id: RepoId }
        option { pr_link: String }
        option { confidence_score: f32 }
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct JobBuilder => Job {
        computed { id: JobId = JobId::new() }
        set { version: u32 = 1 }
        into { org_id: OrgId = OrgId::new() }
        set { status: JobStatus = JobStatus::Queued }
        set { priority: Priority = Priority::Medium }
        option { queue_type: QueueType = None }
        set { order_in_queue: i64 = NOT_QUEUED }
        option { agent_id: AgentId = None }
        computed { user_input: UserInput = UserInput { source: "api".into(), prompt: "do the thing".into(), source_metadata: serde_json::Value::Null } }
        option { repo_id: RepoId = None }
        set { user_acceptance_status: UserAcceptanceStatus = UserAcceptanceStatus::NotReviewed }
        set { user_comments: Vec<String> = Vec::new() }
        option { code_generation_logs: String = None }
        option { code_verification_logs: String = None }
        option { pr_link: String = None }
        option { confidence_score: f32 = None }
        into { updates: String = "" }
        set { created_at_ms: u64 = 0 }
        set { updated_at_ms: u64 = 0 }
        into { created_by: String = "tester" }
        into { updated_by: String = "tester" }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
