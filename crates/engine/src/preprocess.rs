// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Preprocess step (§4.4, C5): the ordered algorithm the Dispatch Workflow
//! runs before it may start a job-execution child workflow.

use crate::error::RuntimeError;
use dispatchd_core::{AgentId, AgentStatus, Clock, JobId, OrgId, QueueType};
use dispatchd_storage::{StoreError, Wal};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessOutcome {
    pub job_id: Option<JobId>,
    pub queue_type: Option<QueueType>,
    pub org_id: Option<OrgId>,
}

impl PreprocessOutcome {
    fn none_with_org(org_id: Option<OrgId>) -> Self {
        Self { job_id: None, queue_type: None, org_id }
    }
}

/// Runs steps 1-5 of §4.4 against one agent. `orphan_threshold` is §1A's
/// `orphan_threshold_secs`, converted to a `Duration` by the caller.
pub fn run<C: Clock, W: Wal>(
    store: &dispatchd_storage::Store<C, W>,
    agent_id: AgentId,
    orphan_threshold: Duration,
) -> Result<PreprocessOutcome, RuntimeError> {
    // Step 1: load agent.
    let agent = match store.get_agent(agent_id) {
        Some(agent) => agent,
        None => return Err(StoreError::AgentNotFound(agent_id.to_string()).into()),
    };
    if agent.status != AgentStatus::Active {
        return Ok(PreprocessOutcome::none_with_org(None));
    }

    // Step 2: orphan reconciliation. Fatal to the activity on failure (the
    // `?` below propagates a transient storage error for the engine to retry.
    store.reclaim_orphans(agent.org_id, agent_id, orphan_threshold.as_millis() as u64)?;

    // Step 3: in-progress heartbeat. Idempotent after step 2; if the agent
    // still owns an in-progress job, touch liveness and stop here so a
    // single agent never runs two jobs at once.
    if store.in_progress_for_agent(agent_id).is_some() {
        // A failed heartbeat write is non-fatal per §4.4's ordering contract.
        if let Err(err) = store.heartbeat(agent_id) {
            tracing::warn!(%agent_id, error = %err, "preprocess heartbeat write failed");
        }
        return Ok(PreprocessOutcome::none_with_org(Some(agent.org_id)));
    }

    // Step 4: queue selection, rework before backlog.
    for queue_type in QueueType::ALL {
        if store.is_paused(agent.org_id, queue_type) {
            continue;
        }
        if let Some(job) = store.claim_next(agent.org_id, queue_type, agent_id)? {
            return Ok(PreprocessOutcome { job_id: Some(job.id), queue_type: Some(queue_type), org_id: Some(agent.org_id) });
        }
    }

    // Step 5.
    Ok(PreprocessOutcome::none_with_org(Some(agent.org_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatchd_core::{FakeClock, JobStatus, UserInput};
    use dispatchd_storage::{MaterializedState, NullWal, Store};

    fn store() -> Store<FakeClock, NullWal> {
        Store::new(FakeClock::new(), NullWal, MaterializedState::default())
    }

    fn input() -> UserInput {
        UserInput { source: "api".into(), prompt: "do it".into(), source_metadata: serde_json::Value::Null }
    }

    fn active_agent(store: &Store<FakeClock, NullWal>, org_id: OrgId) -> AgentId {
        let (agent, _) = store.register_agent(org_id, "agent-1".into(), "127.0.0.1".into(), 7700, None).unwrap();
        agent.id
    }

    #[test]
    fn inactive_agent_returns_all_none() {
        let store = store();
        let org_id = OrgId::new();
        let (agent, _) = store.register_agent(org_id, "agent-1".into(), "127.0.0.1".into(), 7700, None).unwrap();
        // freshly registered agents are Active (register_agent's realization),
        // force it offline to exercise the early-return branch.
        store.ping_failed(agent.id).unwrap();
        store.ping_failed(agent.id).unwrap();
        store.ping_failed(agent.id).unwrap();

        let outcome = run(&store, agent.id, Duration::from_secs(300)).unwrap();
        assert_eq!(outcome, PreprocessOutcome { job_id: None, queue_type: None, org_id: None });
    }

    #[test]
    fn claims_rework_before_backlog() {
        let store = store();
        let org_id = OrgId::new();
        let agent_id = active_agent(&store, org_id);

        let backlog_job = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
        let rework_job = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
        store.insert_at_tail(rework_job.id, QueueType::Rework).unwrap();

        let outcome = run(&store, agent_id, Duration::from_secs(300)).unwrap();
        assert_eq!(outcome.job_id, Some(rework_job.id));
        assert_eq!(outcome.queue_type, Some(QueueType::Rework));
        assert_ne!(outcome.job_id, Some(backlog_job.id));
    }

    #[test]
    fn returns_none_job_when_queues_are_empty() {
        let store = store();
        let org_id = OrgId::new();
        let agent_id = active_agent(&store, org_id);
        let outcome = run(&store, agent_id, Duration::from_secs(300)).unwrap();
        assert_eq!(outcome, PreprocessOutcome { job_id: None, queue_type: None, org_id: Some(org_id) });
    }

    #[test]
    fn skips_paused_queues() {
        let store = store();
        let org_id = OrgId::new();
        let agent_id = active_agent(&store, org_id);
        let job = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
        store.set_paused(org_id, QueueType::Backlog, true).unwrap();

        let outcome = run(&store, agent_id, Duration::from_secs(300)).unwrap();
        assert_eq!(outcome.job_id, None);
        assert_eq!(store.latest_job(job.id).unwrap().status, JobStatus::Queued);
    }

    #[test]
    fn heartbeats_instead_of_claiming_when_agent_already_has_a_job() {
        let store = store();
        let org_id = OrgId::new();
        let agent_id = active_agent(&store, org_id);
        let first = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
        store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
        store.claim_next(org_id, QueueType::Backlog, agent_id).unwrap();

        let outcome = run(&store, agent_id, Duration::from_secs(300)).unwrap();
        assert_eq!(outcome, PreprocessOutcome { job_id: None, queue_type: None, org_id: Some(org_id) });
        // The already-claimed job is untouched, not re-claimed.
        assert_eq!(store.latest_job(first.id).unwrap().status, JobStatus::InProgress);
    }
}
