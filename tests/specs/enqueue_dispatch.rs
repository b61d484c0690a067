// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 1 (spec.md §8): three jobs dispatched in FIFO order, one per
//! minute, leaving the backlog empty.

use crate::support::{input, register_agent, store_with_clock};
use dispatchd_adapters::FakeAdapter;
use dispatchd_core::{JobStatus, OrgId};
use dispatchd_engine::dispatch::{self, InFlightGuard};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn three_jobs_dispatch_in_order_one_per_minute() {
    let (store, clock) = store_with_clock();
    let store = Arc::new(store);
    let adapter = Arc::new(FakeAdapter::new());
    let in_flight = Arc::new(InFlightGuard::new());
    let org_id = OrgId::new();
    let agent_id = register_agent(&store, org_id, "agent-1");

    let j1 = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
    let j2 = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
    let j3 = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();

    let orphan_threshold = Duration::from_secs(300);
    let dispatch_interval = Duration::from_secs(60);

    let first = dispatch::tick(&store, &adapter, &in_flight, agent_id, orphan_threshold, Duration::from_secs(300)).await;
    assert_eq!(first.job_id, Some(j1.id));

    clock.advance(dispatch_interval);
    let second = dispatch::tick(&store, &adapter, &in_flight, agent_id, orphan_threshold, Duration::from_secs(300)).await;
    assert_eq!(second.job_id, Some(j2.id));

    clock.advance(dispatch_interval);
    let third = dispatch::tick(&store, &adapter, &in_flight, agent_id, orphan_threshold, Duration::from_secs(300)).await;
    assert_eq!(third.job_id, Some(j3.id));

    for job in [&j1, &j2, &j3] {
        let latest = store.latest_job(job.id).unwrap();
        assert_eq!(latest.status, JobStatus::Completed);
        assert_eq!(latest.queue_type, None);
    }

    clock.advance(dispatch_interval);
    let fourth = dispatch::tick(&store, &adapter, &in_flight, agent_id, orphan_threshold, Duration::from_secs(300)).await;
    assert!(!fourth.processed);
}
