// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from WAL replay, and the [`Store`] that guards
//! it behind a single critical section.

mod agents;
mod jobs;

use crate::error::StoreError;
use crate::wal::Wal;
use dispatchd_core::{Activity, Agent, AgentId, Clock, Event, Job, JobId, OrgId, QueueType, UserAcceptanceStatus, UserInput};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    /// Every version of every job, keyed by `(id, version)`.
    pub jobs: HashMap<(JobId, u32), Job>,
    /// `job_id -> latest version number`.
    pub latest_version: HashMap<JobId, u32>,
    pub agents: HashMap<AgentId, Agent>,
    /// Upsert key for agent registration: `(org_id, host) -> agent_id`.
    pub agents_by_org_host: HashMap<(OrgId, String), AgentId>,
    pub activities: Vec<Activity>,
    /// `(org_id, queue_type) -> is_paused`. Absent means `false`.
    pub queue_paused: HashMap<(OrgId, QueueType), bool>,
}

impl MaterializedState {
    pub fn latest_job(&self, id: JobId) -> Option<&Job> {
        let version = *self.latest_version.get(&id)?;
        self.jobs.get(&(id, version))
    }

    fn latest_job_mut(&mut self, id: JobId) -> Option<&mut Job> {
        let version = *self.latest_version.get(&id)?;
        self.jobs.get_mut(&(id, version))
    }

    pub fn is_paused(&self, org_id: OrgId, queue_type: QueueType) -> bool {
        self.queue_paused.get(&(org_id, queue_type)).copied().unwrap_or(false)
    }

    /// Latest-version, `status = queued` rows for `(org, queue)`, sorted by
    /// `order_in_queue` (invariant 1 in §3: this is always `[0, n-1]`).
    pub fn queued_latest(&self, org_id: OrgId, queue_type: QueueType) -> Vec<&Job> {
        let mut rows: Vec<&Job> = self
            .jobs
            .values()
            .filter(|j| {
                self.latest_version.get(&j.id) == Some(&j.version)
                    && j.org_id == org_id
                    && j.is_queued()
                    && j.queue_type == Some(queue_type)
            })
            .collect();
        rows.sort_by_key(|j| j.order_in_queue);
        rows
    }

    /// Apply an event to derive state changes.
    ///
    /// All handlers MUST be idempotent: replaying the same event twice must
    /// produce the same state as applying it once. Every variant here sets
    /// absolute values rather than relative deltas for exactly that reason.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::AgentRegistered { .. }
            | Event::AgentHeartbeatReceived { .. }
            | Event::AgentPingFailed { .. }
            | Event::AgentMarkedOffline { .. }
            | Event::AgentMarkedActive { .. }
            | Event::AgentStreamBound { .. }
            | Event::AgentRemoved { .. } => agents::apply(self, event),

            Event::JobCreated { .. }
            | Event::JobNewVersionOpened { .. }
            | Event::JobClaimed { .. }
            | Event::JobOrphaned { .. }
            | Event::JobQueuePositionSet { .. }
            | Event::JobStatusSet { .. }
            | Event::JobAcceptanceSet { .. }
            | Event::JobPrioritySet { .. }
            | Event::JobCommentAdded { .. }
            | Event::JobPrLinked { .. }
            | Event::JobConfidenceSet { .. }
            | Event::JobLogAppended { .. }
            | Event::JobLogsCleared { .. }
            | Event::JobUpdateAppended { .. }
            | Event::JobRepoSet { .. } => jobs::apply(self, event),

            Event::QueuePauseSet { org_id, queue_type, is_paused } => {
                self.queue_paused.insert((*org_id, *queue_type), *is_paused);
            }

            Event::ActivityRecorded { activity } => {
                self.activities.push((**activity).clone());
            }

            Event::Unknown => {}
        }
    }
}

/// Guards [`MaterializedState`] behind one `parking_lot::Mutex`, pairing
/// every mutation with a WAL append in the same critical section. Holding
/// the lock for the duration of an operation realizes the "one serializable
/// transaction" requirement named throughout §4 without an external SQL
/// engine.
pub struct Store<C: Clock, W: Wal = crate::wal::FileWal> {
    state: Mutex<MaterializedState>,
    wal: Mutex<W>,
    clock: C,
}

impl<C: Clock, W: Wal> Store<C, W> {
    pub fn new(clock: C, wal: W, initial: MaterializedState) -> Self {
        Self { state: Mutex::new(initial), wal: Mutex::new(wal), clock }
    }

    /// Rebuild state from a WAL replay (e.g. `FileWal::replay`) and wrap it.
    pub fn from_events(clock: C, wal: W, events: &[Event]) -> Self {
        let mut state = MaterializedState::default();
        for event in events {
            state.apply_event(event);
        }
        Self::new(clock, wal, state)
    }

    fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    fn commit(&self, state: &mut MaterializedState, events: &[Event]) -> Result<(), StoreError> {
        let mut wal = self.wal.lock();
        for event in events {
            tracing::debug!(event = %event.log_summary(), "committing event");
            state.apply_event(event);
            wal.append(event)?;
        }
        Ok(())
    }

    pub fn snapshot(&self) -> MaterializedState {
        self.state.lock().clone()
    }

    // --- Job queries ---

    pub fn latest_job(&self, id: JobId) -> Option<Job> {
        self.state.lock().latest_job(id).cloned()
    }

    /// A specific version of a job, for `GET /jobs/:id?version=`.
    pub fn job_version(&self, id: JobId, version: u32) -> Option<Job> {
        self.state.lock().jobs.get(&(id, version)).cloned()
    }

    /// Latest-version rows for `org_id`, oldest first, for `GET /jobs`.
    pub fn jobs_for_org(&self, org_id: OrgId) -> Vec<Job> {
        let state = self.state.lock();
        let mut rows: Vec<Job> =
            state.jobs.values().filter(|j| state.latest_version.get(&j.id) == Some(&j.version) && j.org_id == org_id).cloned().collect();
        rows.sort_by_key(|j| j.created_at_ms);
        rows
    }

    fn require_job(state: &MaterializedState, id: JobId) -> Result<Job, StoreError> {
        state.latest_job(id).cloned().ok_or_else(|| StoreError::JobNotFound(id.to_string()))
    }

    fn require_agent(state: &MaterializedState, id: AgentId) -> Result<Agent, StoreError> {
        state.agents.get(&id).cloned().ok_or_else(|| StoreError::AgentNotFound(id.to_string()))
    }

    // --- Job creation (C1, C4) ---

    pub fn create_job(&self, org_id: OrgId, user_input: UserInput, created_by: String) -> Job {
        let now = self.now_ms();
        let job = Job::new(JobId::new(), org_id, user_input, created_by, now);
        let mut state = self.state.lock();
        let event = Event::JobCreated { job: Box::new(job.clone()) };
        state.apply_event(&event);
        if let Err(err) = self.wal.lock().append(&event) {
            tracing::error!(error = %err, "failed to persist job creation");
        }
        job
    }

    /// `POST /jobs`: create and place at the tail of `backlog` in one
    /// critical section.
    pub fn enqueue_new_job(&self, org_id: OrgId, user_input: UserInput, created_by: String) -> Result<Job, StoreError> {
        let now = self.now_ms();
        let job = Job::new(JobId::new(), org_id, user_input, created_by, now);
        let mut state = self.state.lock();
        let created = Event::JobCreated { job: Box::new(job.clone()) };
        state.apply_event(&created);
        let position = state.queued_latest(org_id, QueueType::Backlog).len() as i64;
        let queued = Event::JobQueuePositionSet {
            job_id: job.id,
            version: job.version,
            queue_type: Some(QueueType::Backlog),
            position,
            at_ms: now,
        };
        let mut wal = self.wal.lock();
        wal.append(&created)?;
        state.apply_event(&queued);
        wal.append(&queued)?;
        Self::require_job(&state, job.id)
    }

    // --- Queue model (§4.1) ---

    pub fn next_position(&self, org_id: OrgId, queue_type: QueueType) -> i64 {
        self.state.lock().queued_latest(org_id, queue_type).len() as i64
    }

    /// In one critical section: picks the minimum-`order_in_queue` row,
    /// marks it `in-progress` under this agent, and returns it. Returns
    /// `None` if the queue is empty. Queue membership and position are left
    /// untouched (Q1, resolved in DESIGN.md), so orphan recovery can restore
    /// the job without recomputing a position.
    pub fn claim_next(&self, org_id: OrgId, queue_type: QueueType, agent_id: AgentId) -> Result<Option<Job>, StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let Some(candidate) = state.queued_latest(org_id, queue_type).first().map(|j| (j.id, j.version)) else {
            return Ok(None);
        };
        let event = Event::JobClaimed { job_id: candidate.0, version: candidate.1, agent_id, at_ms: now };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Ok(Some(Self::require_job(&state, candidate.0)?))
    }

    /// Claims a specific job regardless of its queue position, for the
    /// manual `POST /jobs/:id/execute` path (§6). The caller is responsible
    /// for having already checked `status = queued`. Per Q1, this leaves
    /// `queue_type`/`order_in_queue` intact, mirroring [`Store::claim_next`]'s
    /// event shape, so orphan recovery always has a valid slot to return to.
    pub fn claim_specific(&self, job_id: JobId, agent_id: AgentId) -> Result<Job, StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let job = Self::require_job(&state, job_id)?;
        let event = Event::JobClaimed { job_id, version: job.version, agent_id, at_ms: now };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Self::require_job(&state, job_id)
    }

    /// Returns the job's `(queue_type, order_in_queue)` before clearing it,
    /// or `None` if it was not queued. The caller is responsible for having
    /// already advanced `status`, and for calling
    /// [`Store::reprioritize_after_removal`] with the returned position.
    pub fn remove_from_queue(&self, job_id: JobId) -> Result<Option<(QueueType, i64)>, StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let job = Self::require_job(&state, job_id)?;
        let Some(queue_type) = job.queue_type else { return Ok(None) };
        let position = job.order_in_queue;
        let event = Event::JobQueuePositionSet {
            job_id,
            version: job.version,
            queue_type: None,
            position: dispatchd_core::NOT_QUEUED,
            at_ms: now,
        };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Ok(Some((queue_type, position)))
    }

    /// Decrements `order_in_queue` by 1 for every latest-version queued row
    /// in `(org, queue)` with `order_in_queue > removed_position`, closing
    /// the gap left by a removal.
    pub fn reprioritize_after_removal(&self, org_id: OrgId, queue_type: QueueType, removed_position: i64) -> Result<(), StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let shifted: Vec<(JobId, u32, i64)> = state
            .queued_latest(org_id, queue_type)
            .into_iter()
            .filter(|j| j.order_in_queue > removed_position)
            .map(|j| (j.id, j.version, j.order_in_queue - 1))
            .collect();
        let events: Vec<Event> = shifted
            .into_iter()
            .map(|(job_id, version, position)| Event::JobQueuePositionSet {
                job_id,
                version,
                queue_type: Some(queue_type),
                position,
                at_ms: now,
            })
            .collect();
        self.commit(&mut state, &events)
    }

    pub fn insert_at_tail(&self, job_id: JobId, queue_type: QueueType) -> Result<Job, StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let job = Self::require_job(&state, job_id)?;
        let position = state.queued_latest(job.org_id, queue_type).len() as i64;
        let event = Event::JobQueuePositionSet { job_id, version: job.version, queue_type: Some(queue_type), position, at_ms: now };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Self::require_job(&state, job_id)
    }

    /// Removes the job from its current `(org, queue)` ordering and
    /// re-inserts it at `new_position`, rewriting every affected row's
    /// `order_in_queue` to keep the range `[0, n-1]` contiguous (P4).
    /// `new_position` is clamped; a no-op if it equals the job's current
    /// position.
    pub fn move_to_position(&self, job_id: JobId, new_position: i64) -> Result<Job, StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let job = Self::require_job(&state, job_id)?;
        let Some(queue_type) = job.queue_type else {
            return Err(StoreError::InvalidTransition(format!("job {job_id} is not queued")));
        };
        let ordered = state.queued_latest(job.org_id, queue_type);
        let n = ordered.len() as i64;
        let clamped = new_position.clamp(0, n - 1);
        if clamped == job.order_in_queue {
            return Ok(job);
        }
        let mut ids: Vec<(JobId, u32)> = ordered.iter().map(|j| (j.id, j.version)).collect();
        let current_index = ids
            .iter()
            .position(|&(id, _)| id == job_id)
            .ok_or_else(|| StoreError::InvalidTransition(format!("job {job_id} missing from its own queue listing")))?;
        let (id, version) = ids.remove(current_index);
        let insert_at = clamped as usize;
        ids.insert(insert_at.min(ids.len()), (id, version));
        let events: Vec<Event> = ids
            .into_iter()
            .enumerate()
            .map(|(position, (job_id, version))| Event::JobQueuePositionSet {
                job_id,
                version,
                queue_type: Some(queue_type),
                position: position as i64,
                at_ms: now,
            })
            .collect();
        self.commit(&mut state, &events)?;
        Self::require_job(&state, job_id)
    }

    // --- Job mutations (§4.8 primitives; orchestration lives in `dispatchd-engine`) ---

    pub fn set_status(&self, job_id: JobId, status: dispatchd_core::JobStatus) -> Result<Job, StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let job = Self::require_job(&state, job_id)?;
        let event = Event::JobStatusSet { job_id, version: job.version, status, at_ms: now };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Self::require_job(&state, job_id)
    }

    pub fn set_acceptance(&self, job_id: JobId, acceptance: UserAcceptanceStatus) -> Result<Job, StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let job = Self::require_job(&state, job_id)?;
        let event = Event::JobAcceptanceSet { job_id, version: job.version, acceptance, at_ms: now };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Self::require_job(&state, job_id)
    }

    pub fn set_priority(&self, job_id: JobId, priority: dispatchd_core::Priority) -> Result<Job, StoreError> {
        let mut state = self.state.lock();
        let job = Self::require_job(&state, job_id)?;
        let event = Event::JobPrioritySet { job_id, version: job.version, priority };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Self::require_job(&state, job_id)
    }

    pub fn add_comment(&self, job_id: JobId, comment: String) -> Result<Job, StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let job = Self::require_job(&state, job_id)?;
        let event = Event::JobCommentAdded { job_id, version: job.version, comment, at_ms: now };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Self::require_job(&state, job_id)
    }

    pub fn set_pr_link(&self, job_id: JobId, pr_link: String) -> Result<Job, StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let job = Self::require_job(&state, job_id)?;
        let event = Event::JobPrLinked { job_id, version: job.version, pr_link, at_ms: now };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Self::require_job(&state, job_id)
    }

    pub fn set_confidence(&self, job_id: JobId, confidence_score: f32) -> Result<Job, StoreError> {
        let mut state = self.state.lock();
        let job = Self::require_job(&state, job_id)?;
        let event = Event::JobConfidenceSet { job_id, version: job.version, confidence_score };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Self::require_job(&state, job_id)
    }

    pub fn set_repo(&self, job_id: JobId, repo_id: Option<dispatchd_core::RepoId>) -> Result<Job, StoreError> {
        let mut state = self.state.lock();
        let job = Self::require_job(&state, job_id)?;
        let event = Event::JobRepoSet { job_id, version: job.version, repo_id };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Self::require_job(&state, job_id)
    }

    pub fn set_prompt(&self, job_id: JobId, prompt: String) -> Result<Job, StoreError> {
        let mut state = self.state.lock();
        let job = Self::require_job(&state, job_id)?;
        let event = Event::JobPromptSet { job_id, version: job.version, prompt };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Self::require_job(&state, job_id)
    }

    pub fn append_log(&self, job_id: JobId, kind: dispatchd_core::LogKind, line: String) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        let job = Self::require_job(&state, job_id)?;
        let event = Event::JobLogAppended { job_id, version: job.version, kind, line };
        self.commit(&mut state, std::slice::from_ref(&event))
    }

    pub fn append_update(&self, job_id: JobId, line: String) -> Result<(), StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let job = Self::require_job(&state, job_id)?;
        let event = Event::JobUpdateAppended { job_id, version: job.version, line, at_ms: now };
        self.commit(&mut state, std::slice::from_ref(&event))
    }

    /// Opens a new job version: clones the latest version, bumps `version`,
    /// clears both log series (P7), and appends the retry `updates` line —
    /// used when a PUT satisfies the retry predicate in §4.8.
    pub fn open_retry_version(&self, job_id: JobId, retry_line: String) -> Result<Job, StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let mut next = Self::require_job(&state, job_id)?;
        next.version += 1;
        next.clear_logs();
        next.append_update(now, &retry_line);
        next.updated_at_ms = now;
        let event = Event::JobNewVersionOpened { job: Box::new(next.clone()) };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Self::require_job(&state, job_id)
    }

    /// Opens a new job version for the non-retry triggers of the versioning
    /// rule (§3): prompt change, repo change, acceptance to
    /// `reviewed_and_asked_rework`. Unlike [`Store::open_retry_version`] this
    /// does not clear the log series — only a retry does that (P7).
    pub fn open_version(&self, job_id: JobId, audit_line: String) -> Result<Job, StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let mut next = Self::require_job(&state, job_id)?;
        next.version += 1;
        next.append_update(now, &audit_line);
        next.updated_at_ms = now;
        let event = Event::JobNewVersionOpened { job: Box::new(next.clone()) };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Self::require_job(&state, job_id)
    }

    // --- Agent registry (§4.2) ---

    pub fn register_agent(
        &self,
        org_id: OrgId,
        name: String,
        host: String,
        port: u16,
        ip: Option<String>,
    ) -> Result<(Agent, dispatchd_core::AgentStatus), StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let key = (org_id, host.clone());
        let prior = state
            .agents_by_org_host
            .get(&key)
            .and_then(|id| state.agents.get(id))
            .map(|a| a.status)
            .unwrap_or(dispatchd_core::AgentStatus::Offline);
        let agent_id = state.agents_by_org_host.get(&key).copied().unwrap_or_else(AgentId::new);
        let event = Event::AgentRegistered { agent_id, org_id, name, host, port, ip, at_ms: now };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        let agent = state.agents.get(&agent_id).cloned().ok_or_else(|| StoreError::AgentNotFound(agent_id.to_string()))?;
        Ok((agent, prior))
    }

    pub fn get_agent(&self, agent_id: AgentId) -> Option<Agent> {
        self.state.lock().agents.get(&agent_id).cloned()
    }

    /// All registered agents for `org_id`, for `GET /agents`.
    pub fn agents_for_org(&self, org_id: OrgId) -> Vec<Agent> {
        let mut rows: Vec<Agent> = self.state.lock().agents.values().filter(|a| a.org_id == org_id).cloned().collect();
        rows.sort_by_key(|a| a.created_at_ms);
        rows
    }

    /// Every registered agent across every org, for resuming schedules at
    /// process startup.
    pub fn all_agents(&self) -> Vec<Agent> {
        self.state.lock().agents.values().cloned().collect()
    }

    /// Removes an agent's registry row, for `DELETE /agents/:id`. The caller
    /// is responsible for also removing its schedules.
    pub fn remove_agent(&self, agent_id: AgentId) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if !state.agents.contains_key(&agent_id) {
            return Err(StoreError::AgentNotFound(agent_id.to_string()));
        }
        let event = Event::AgentRemoved { agent_id };
        self.commit(&mut state, std::slice::from_ref(&event))
    }

    pub fn heartbeat(&self, agent_id: AgentId) -> Result<(), StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        if !state.agents.contains_key(&agent_id) {
            return Err(StoreError::AgentNotFound(agent_id.to_string()));
        }
        let event = Event::AgentHeartbeatReceived { agent_id, at_ms: now };
        self.commit(&mut state, std::slice::from_ref(&event))
    }

    pub fn bind_stream(&self, agent_id: AgentId) -> Result<(), StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        if !state.agents.contains_key(&agent_id) {
            return Err(StoreError::AgentNotFound(agent_id.to_string()));
        }
        let event = Event::AgentStreamBound { agent_id, at_ms: now };
        self.commit(&mut state, std::slice::from_ref(&event))
    }

    /// Records a failed health-check ping. Returns the updated agent so the
    /// caller can act on `should_go_offline`/`status` (§4.7 step 4).
    pub fn ping_failed(&self, agent_id: AgentId) -> Result<Agent, StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        if !state.agents.contains_key(&agent_id) {
            return Err(StoreError::AgentNotFound(agent_id.to_string()));
        }
        let fail_event = Event::AgentPingFailed { agent_id, at_ms: now };
        state.apply_event(&fail_event);
        self.wal.lock().append(&fail_event)?;
        let goes_offline = state.agents.get(&agent_id).map(Agent::should_go_offline).unwrap_or(false);
        if goes_offline {
            let offline_event = Event::AgentMarkedOffline { agent_id, at_ms: now };
            state.apply_event(&offline_event);
            self.wal.lock().append(&offline_event)?;
        }
        Self::require_agent(&state, agent_id)
    }

    pub fn mark_active(&self, agent_id: AgentId) -> Result<Agent, StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        if !state.agents.contains_key(&agent_id) {
            return Err(StoreError::AgentNotFound(agent_id.to_string()));
        }
        let event = Event::AgentMarkedActive { agent_id, at_ms: now };
        self.commit(&mut state, std::slice::from_ref(&event))?;
        Self::require_agent(&state, agent_id)
    }

    // --- Queue pause (§4.1 data model) ---

    pub fn is_paused(&self, org_id: OrgId, queue_type: QueueType) -> bool {
        self.state.lock().is_paused(org_id, queue_type)
    }

    pub fn set_paused(&self, org_id: OrgId, queue_type: QueueType, is_paused: bool) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        let event = Event::QueuePauseSet { org_id, queue_type, is_paused };
        self.commit(&mut state, std::slice::from_ref(&event))
    }

    // --- Orphan reconciliation (§4.4 step 2) ---

    /// Finds latest-version `in-progress` jobs for `org_id` that are either
    /// owned by `agent_id` or stale (`updated_at_ms < now - orphan_threshold`),
    /// and returns them to `queued` with `agent_id = none`, leaving
    /// `queue_type`/`order_in_queue` untouched (P6, Q1).
    pub fn reclaim_orphans(&self, org_id: OrgId, agent_id: AgentId, orphan_threshold_ms: u64) -> Result<Vec<Job>, StoreError> {
        let now = self.now_ms();
        let mut state = self.state.lock();
        let stale_cutoff = now.saturating_sub(orphan_threshold_ms);
        let targets: Vec<(JobId, u32)> = state
            .jobs
            .values()
            .filter(|j| {
                state.latest_version.get(&j.id) == Some(&j.version)
                    && j.org_id == org_id
                    && j.status == dispatchd_core::JobStatus::InProgress
                    && (j.agent_id == Some(agent_id) || j.updated_at_ms < stale_cutoff)
            })
            .map(|j| (j.id, j.version))
            .collect();
        let events: Vec<Event> = targets.iter().map(|&(job_id, version)| Event::JobOrphaned { job_id, version, at_ms: now }).collect();
        self.commit(&mut state, &events)?;
        Ok(targets.into_iter().filter_map(|(id, _)| state.latest_job(id).cloned()).collect())
    }

    /// The single in-progress job owned by this agent, if any (§4.4 step 3).
    pub fn in_progress_for_agent(&self, agent_id: AgentId) -> Option<Job> {
        let state = self.state.lock();
        state
            .jobs
            .values()
            .find(|j| {
                state.latest_version.get(&j.id) == Some(&j.version)
                    && j.status == dispatchd_core::JobStatus::InProgress
                    && j.agent_id == Some(agent_id)
            })
            .cloned()
    }

    // --- Activity audit trail (§7) ---

    /// Records one audit-trail row. The REST façade calls this on every
    /// create/update/archive/execute/reprioritize request it accepts.
    pub fn record_activity(&self, job_id: JobId, org_id: OrgId, name: impl Into<String>, summary: impl Into<String>, by: impl Into<String>) {
        let now = self.now_ms();
        let activity = Activity::new(job_id, org_id, name, summary, by, now);
        let mut state = self.state.lock();
        let event = Event::ActivityRecorded { activity: Box::new(activity) };
        state.apply_event(&event);
        if let Err(err) = self.wal.lock().append(&event) {
            tracing::error!(error = %err, "failed to persist activity record");
        }
    }
}
