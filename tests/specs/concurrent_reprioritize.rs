// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 4 (spec.md §8): a reprioritize and a dispatch firing racing over
//! the same queue. The store's single critical section makes every
//! operation atomic, so "concurrent" is modeled as "either order, never
//! interleaved" — both orderings are exercised explicitly. Postcondition:
//! whichever op lands first, no job loses its queue assignment, and the
//! jobs that are still queued keep contiguous positions among themselves.

use crate::support::{input, register_agent, store};
use dispatchd_adapters::FakeAdapter;
use dispatchd_core::{OrgId, QueueType};
use dispatchd_engine::dispatch::{self, InFlightGuard};
use dispatchd_engine::reprioritize;
use std::sync::Arc;
use std::time::Duration;

fn still_queued_positions(store: &dispatchd_storage::Store<dispatchd_core::FakeClock, dispatchd_storage::NullWal>, org_id: OrgId) -> Vec<i64> {
    let mut positions: Vec<i64> =
        store.jobs_for_org(org_id).into_iter().filter(|j| j.is_queued() && j.queue_type == Some(QueueType::Backlog)).map(|j| j.order_in_queue).collect();
    positions.sort_unstable();
    positions
}

#[tokio::test]
async fn reprioritize_then_claim_keeps_every_job_assigned() {
    let store = Arc::new(store());
    let adapter = Arc::new(FakeAdapter::new());
    let in_flight = Arc::new(InFlightGuard::new());
    let org_id = OrgId::new();
    let agent_id = register_agent(&store, org_id, "agent-1");

    let j1 = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
    let j2 = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
    let j3 = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();

    // Reprioritize wins the race first: J3 jumps to the head.
    let moved = reprioritize::reprioritize(&store, j3.id, 0).unwrap();
    assert_eq!(moved.order_in_queue, 0);
    assert_eq!(still_queued_positions(&store, org_id), vec![0, 1, 2]);

    let orphan_threshold = Duration::from_secs(300);
    let outcome = dispatch::tick(&store, &adapter, &in_flight, agent_id, orphan_threshold, Duration::from_secs(300)).await;
    assert_eq!(outcome.job_id, Some(j3.id));

    // J1 and J2 never lost their queue assignment.
    assert_eq!(store.latest_job(j1.id).unwrap().queue_type, Some(QueueType::Backlog));
    assert_eq!(store.latest_job(j2.id).unwrap().queue_type, Some(QueueType::Backlog));
}

#[tokio::test]
async fn claim_then_reprioritize_keeps_every_job_assigned() {
    let store = Arc::new(store());
    let adapter = Arc::new(FakeAdapter::new());
    let in_flight = Arc::new(InFlightGuard::new());
    let org_id = OrgId::new();
    let agent_id = register_agent(&store, org_id, "agent-1");

    let j1 = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
    let _j2 = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
    let j3 = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();

    // Dispatch wins the race first: claims J1 off the head before the
    // reprioritize lands.
    let orphan_threshold = Duration::from_secs(300);
    let outcome = dispatch::tick(&store, &adapter, &in_flight, agent_id, orphan_threshold, Duration::from_secs(300)).await;
    assert_eq!(outcome.job_id, Some(j1.id));

    let moved = reprioritize::reprioritize(&store, j3.id, 0).unwrap();
    assert_eq!(moved.order_in_queue, 0);

    // Either J1 (claimed) or J3 (still queued) ends up with a well-defined
    // disposition; neither is left dangling without an assignment.
    let j1_final = store.latest_job(j1.id).unwrap();
    let j3_final = store.latest_job(j3.id).unwrap();
    assert!(j1_final.agent_id.is_some());
    assert_eq!(j3_final.queue_type, Some(QueueType::Backlog));
}
