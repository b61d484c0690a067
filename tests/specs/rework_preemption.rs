// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 2 (spec.md §8): a completed job moved to rework preempts the
//! backlog on the next dispatch firing.

use crate::support::{input, register_agent, store};
use dispatchd_adapters::FakeAdapter;
use dispatchd_core::{JobStatus, OrgId, QueueType, UserAcceptanceStatus};
use dispatchd_engine::dispatch::{self, InFlightGuard};
use dispatchd_engine::reprioritize::{self, JobPatch};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn rework_job_preempts_backlog_on_next_dispatch() {
    let store = Arc::new(store());
    let adapter = Arc::new(FakeAdapter::new());
    let in_flight = Arc::new(InFlightGuard::new());
    let org_id = OrgId::new();
    let agent_id = register_agent(&store, org_id, "agent-1");

    let j1 = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
    let _j2 = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();

    // An unrelated job from an earlier cycle, already completed, never
    // touched this org's backlog.
    let jr = store.create_job(org_id, input(), "tester".into());
    store.set_status(jr.id, JobStatus::Completed).unwrap();

    let patch = JobPatch { status: Some(JobStatus::Queued), user_acceptance_status: Some(UserAcceptanceStatus::ReviewedAndAskedRework), ..Default::default() };
    let requeued = reprioritize::apply_put(&store, jr.id, patch).unwrap();
    assert_eq!(requeued.status, JobStatus::Queued);
    assert_eq!(requeued.queue_type, Some(QueueType::Rework));
    assert_eq!(requeued.order_in_queue, 0);

    let orphan_threshold = Duration::from_secs(300);
    let outcome = dispatch::tick(&store, &adapter, &in_flight, agent_id, orphan_threshold, Duration::from_secs(300)).await;
    assert_eq!(outcome.job_id, Some(jr.id));
    assert_eq!(outcome.queue_type, Some(QueueType::Rework));

    // J1 never got a look-in: still queued, untouched, at the backlog head.
    let j1_latest = store.latest_job(j1.id).unwrap();
    assert_eq!(j1_latest.status, JobStatus::Queued);
    assert_eq!(j1_latest.order_in_queue, 0);
}
