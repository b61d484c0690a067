// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch Workflow (§4.5, C6): one firing per agent per interval. Calls
//! Preprocess, and if it returned a job, starts (and awaits) a
//! job-execution "child workflow" — realized here as a deduplicated async
//! call rather than an actual workflow-engine child, per §9's realization
//! note.

use crate::error::RuntimeError;
use crate::job_execution;
use crate::preprocess;
use dispatchd_adapters::AgentAdapter;
use dispatchd_core::{AgentId, Clock, JobId, QueueType};
use dispatchd_storage::Wal;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub processed: bool,
    pub job_id: Option<JobId>,
    pub queue_type: Option<QueueType>,
}

/// Dedup guard realizing "deterministic child-workflow-id": a job already
/// in flight is never started twice from the same process.
#[derive(Default)]
pub struct InFlightGuard(Mutex<HashSet<JobId>>);

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn try_enter(&self, job_id: JobId) -> bool {
        self.0.lock().insert(job_id)
    }

    pub(crate) fn leave(&self, job_id: JobId) {
        self.0.lock().remove(&job_id);
    }
}

/// Runs one Dispatch Workflow firing for `agent_id`. On a preprocess error,
/// logs and returns `processed: false` rather than propagating — the next
/// minute's firing will reconcile via orphan detection, per §4.5's
/// child-start-failure note (extended here to preprocess failures too, since
/// both are meant to self-heal on the next tick rather than poison the
/// schedule).
pub async fn tick<C, W, A>(
    store: &Arc<dispatchd_storage::Store<C, W>>,
    adapter: &Arc<A>,
    in_flight: &Arc<InFlightGuard>,
    agent_id: AgentId,
    orphan_threshold: Duration,
    heartbeat_timeout: Duration,
) -> DispatchOutcome
where
    C: Clock,
    W: Wal,
    A: AgentAdapter + 'static,
{
    let outcome = match preprocess::run(store, agent_id, orphan_threshold) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(%agent_id, error = %err, "preprocess failed, will reconcile next tick");
            return DispatchOutcome { processed: false, job_id: None, queue_type: None };
        }
    };

    let Some(job_id) = outcome.job_id else {
        return DispatchOutcome { processed: false, job_id: None, queue_type: None };
    };

    if !in_flight.try_enter(job_id) {
        tracing::warn!(%job_id, "job-execution already in flight, skipping duplicate start");
        return DispatchOutcome { processed: false, job_id: Some(job_id), queue_type: outcome.queue_type };
    }

    let result = job_execution::run(store, adapter, agent_id, job_id, heartbeat_timeout).await;
    in_flight.leave(job_id);

    if let Err(err) = result {
        tracing::error!(%job_id, error = %err, "job execution failed");
    }

    DispatchOutcome { processed: true, job_id: Some(job_id), queue_type: outcome.queue_type }
}
