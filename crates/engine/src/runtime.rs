// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Runtime` wires the Store, the agent adapter, the health-check `Pinger`,
//! and the Schedule Registry together. It is the crate's single entry point
//! for `dispatchd-daemon` to drive: start/stop an agent's schedule, run a
//! user-initiated reconnect, and apply the reprioritization endpoints.

use crate::error::RuntimeError;
use crate::health_check::{self, Pinger};
use crate::reprioritize::{self, JobPatch};
use crate::schedule::ScheduleRegistry;
use crate::{dispatch, dispatch::InFlightGuard};
use dispatchd_adapters::AgentAdapter;
use dispatchd_core::{AgentId, Clock, Job, JobId, JobStatus};
use dispatchd_storage::{Store, Wal};
use std::sync::Arc;
use std::time::Duration;

pub struct Runtime<C, W, A, P>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    store: Arc<Store<C, W>>,
    adapter: Arc<A>,
    pinger: Arc<P>,
    schedules: Arc<ScheduleRegistry>,
    in_flight: Arc<InFlightGuard>,
    dispatch_interval: Duration,
    health_check_interval: Duration,
    health_check_ack_timeout: Duration,
    orphan_threshold: Duration,
    execute_heartbeat_timeout: Duration,
}

impl<C, W, A, P> Runtime<C, W, A, P>
where
    C: Clock + 'static,
    W: Wal + 'static,
    A: AgentAdapter + 'static,
    P: Pinger + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<Store<C, W>>,
        adapter: Arc<A>,
        pinger: Arc<P>,
        dispatch_interval: Duration,
        health_check_interval: Duration,
        health_check_ack_timeout: Duration,
        orphan_threshold: Duration,
        execute_heartbeat_timeout: Duration,
    ) -> Self {
        Self {
            store,
            adapter,
            pinger,
            schedules: Arc::new(ScheduleRegistry::new()),
            in_flight: Arc::new(InFlightGuard::new()),
            dispatch_interval,
            health_check_interval,
            health_check_ack_timeout,
            orphan_threshold,
            execute_heartbeat_timeout,
        }
    }

    pub fn store(&self) -> &Arc<Store<C, W>> {
        &self.store
    }

    pub fn schedules(&self) -> &Arc<ScheduleRegistry> {
        &self.schedules
    }

    /// Starts (or resumes) `agent_id`'s Dispatch and Health-Check schedules.
    /// Call this once per agent at daemon startup for every active agent,
    /// and again whenever an agent registers.
    pub fn start_agent(&self, agent_id: AgentId) {
        let store = self.store.clone();
        let adapter = self.adapter.clone();
        let in_flight = self.in_flight.clone();
        let orphan_threshold = self.orphan_threshold;
        let heartbeat_timeout = self.execute_heartbeat_timeout;
        let dispatch_tick = move || {
            let store = store.clone();
            let adapter = adapter.clone();
            let in_flight = in_flight.clone();
            async move {
                let _ = dispatch::tick(&store, &adapter, &in_flight, agent_id, orphan_threshold, heartbeat_timeout).await;
            }
        };

        let store = self.store.clone();
        let schedules = self.schedules.clone();
        let pinger = self.pinger.clone();
        let ack_timeout = self.health_check_ack_timeout;
        let health_check_tick = move || {
            let store = store.clone();
            let schedules = schedules.clone();
            let pinger = pinger.clone();
            async move {
                let _ = health_check::tick(&store, &schedules, pinger.as_ref(), agent_id, ack_timeout).await;
            }
        };

        self.schedules.create_or_resume(agent_id, self.dispatch_interval, self.health_check_interval, dispatch_tick, health_check_tick);
    }

    pub fn stop_agent(&self, agent_id: AgentId) {
        self.schedules.remove(agent_id);
    }

    /// User-initiated reconnect: one synchronous ping, then resumes the
    /// agent's schedules.
    pub async fn reconnect_agent(&self, agent_id: AgentId, ping_timeout: Duration) -> Result<(), RuntimeError> {
        health_check::reconnect(&self.store, &self.schedules, self.pinger.as_ref(), agent_id, ping_timeout, self.dispatch_interval, self.health_check_interval).await
    }

    pub fn apply_put(&self, job_id: JobId, patch: JobPatch) -> Result<Job, RuntimeError> {
        reprioritize::apply_put(&self.store, job_id, patch)
    }

    pub fn reprioritize(&self, job_id: JobId, position: i64) -> Result<Job, RuntimeError> {
        reprioritize::reprioritize(&self.store, job_id, position)
    }

    /// `POST /jobs/:id/execute` (§6): manual dispatch of one queued job onto
    /// a chosen agent, bypassing the Dispatch Workflow's own queue-head
    /// selection. Per Q1, the claim leaves `queue_type`/`order_in_queue`
    /// intact (same as `claim_next`) so orphan recovery always has a valid
    /// slot to return the job to; the Job-Execution Workflow itself runs in
    /// the background, same as a scheduled dispatch tick.
    pub fn execute_now(&self, job_id: JobId, agent_id: AgentId) -> Result<Job, RuntimeError> {
        let job = self.store.latest_job(job_id).ok_or_else(|| dispatchd_storage::StoreError::JobNotFound(job_id.to_string()))?;
        if job.status != JobStatus::Queued || job.queue_type.is_none() {
            return Err(RuntimeError::ForbiddenTransition(format!("job {job_id} is not queued with a queue assigned")));
        }

        let claimed = self.store.claim_specific(job_id, agent_id)?;

        if !self.in_flight.try_enter(job_id) {
            return Ok(claimed);
        }
        let store = self.store.clone();
        let adapter = self.adapter.clone();
        let in_flight = self.in_flight.clone();
        let heartbeat_timeout = self.execute_heartbeat_timeout;
        tokio::spawn(async move {
            if let Err(err) = crate::job_execution::run(&store, adapter.as_ref(), agent_id, job_id, heartbeat_timeout).await {
                tracing::error!(%job_id, error = %err, "manually dispatched job execution failed");
            }
            in_flight.leave(job_id);
        });

        Ok(claimed)
    }
}
