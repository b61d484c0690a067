// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::wal::NullWal;
use crate::{MaterializedState, Store};
use dispatchd_core::{FakeClock, JobStatus, OrgId, QueueType, UserInput};

fn store() -> Store<FakeClock, NullWal> {
    Store::new(FakeClock::new(), NullWal, MaterializedState::default())
}

fn input() -> UserInput {
    UserInput { source: "api".into(), prompt: "do the thing".into(), source_metadata: serde_json::Value::Null }
}

#[test]
fn enqueue_places_at_backlog_tail_with_contiguous_positions() {
    let store = store();
    let org = OrgId::new();
    let a = store.enqueue_new_job(org, input(), "tester".into()).unwrap();
    let b = store.enqueue_new_job(org, input(), "tester".into()).unwrap();
    assert_eq!(a.order_in_queue, 0);
    assert_eq!(b.order_in_queue, 1);
    assert_eq!(a.queue_type, Some(QueueType::Backlog));
}

#[test]
fn claim_next_picks_minimum_position_and_preserves_queue_slot() {
    let store = store();
    let org = OrgId::new();
    let a = store.enqueue_new_job(org, input(), "tester".into()).unwrap();
    store.enqueue_new_job(org, input(), "tester".into()).unwrap();
    let agent = dispatchd_core::AgentId::new();

    let claimed = store.claim_next(org, QueueType::Backlog, agent).unwrap().unwrap();
    assert_eq!(claimed.id, a.id);
    assert_eq!(claimed.status, JobStatus::InProgress);
    assert_eq!(claimed.agent_id, Some(agent));
    // Q1: queue_type/order_in_queue survive the claim unchanged.
    assert_eq!(claimed.queue_type, Some(QueueType::Backlog));
    assert_eq!(claimed.order_in_queue, 0);
}

#[test]
fn claim_next_on_empty_queue_returns_none() {
    let store = store();
    let org = OrgId::new();
    let agent = dispatchd_core::AgentId::new();
    assert!(store.claim_next(org, QueueType::Backlog, agent).unwrap().is_none());
}

#[test]
fn rework_is_not_backlog_and_claims_independently() {
    let store = store();
    let org = OrgId::new();
    let backlog_job = store.enqueue_new_job(org, input(), "tester".into()).unwrap();
    let rework_job = store.enqueue_new_job(org, input(), "tester".into()).unwrap();
    store.insert_at_tail(rework_job.id, QueueType::Rework).unwrap();

    let agent = dispatchd_core::AgentId::new();
    let claimed = store.claim_next(org, QueueType::Rework, agent).unwrap().unwrap();
    assert_eq!(claimed.id, rework_job.id);
    assert_ne!(claimed.id, backlog_job.id);
}

#[test]
fn remove_and_reprioritize_closes_the_gap() {
    let store = store();
    let org = OrgId::new();
    let a = store.enqueue_new_job(org, input(), "tester".into()).unwrap();
    let b = store.enqueue_new_job(org, input(), "tester".into()).unwrap();
    let c = store.enqueue_new_job(org, input(), "tester".into()).unwrap();

    let removed = store.remove_from_queue(b.id).unwrap().unwrap();
    assert_eq!(removed, (QueueType::Backlog, 1));
    store.reprioritize_after_removal(org, QueueType::Backlog, 1).unwrap();

    let a = store.latest_job(a.id).unwrap();
    let c = store.latest_job(c.id).unwrap();
    assert_eq!(a.order_in_queue, 0);
    assert_eq!(c.order_in_queue, 1);
    assert_eq!(store.next_position(org, QueueType::Backlog), 2);
}

#[test]
fn remove_from_queue_on_unqueued_job_is_none() {
    let store = store();
    let org = OrgId::new();
    let job = store.create_job(org, input(), "tester".into());
    assert!(store.remove_from_queue(job.id).unwrap().is_none());
}

#[test]
fn move_to_position_is_a_permutation_and_clamps() {
    let store = store();
    let org = OrgId::new();
    let a = store.enqueue_new_job(org, input(), "tester".into()).unwrap();
    let b = store.enqueue_new_job(org, input(), "tester".into()).unwrap();
    let c = store.enqueue_new_job(org, input(), "tester".into()).unwrap();

    let moved = store.move_to_position(a.id, 5).unwrap(); // clamps to n-1 = 2
    assert_eq!(moved.order_in_queue, 2);

    let positions: Vec<i64> = [a.id, b.id, c.id].iter().map(|id| store.latest_job(*id).unwrap().order_in_queue).collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![0, 1, 2]);
}

#[test]
fn move_to_position_noop_when_already_there() {
    let store = store();
    let org = OrgId::new();
    let a = store.enqueue_new_job(org, input(), "tester".into()).unwrap();
    store.enqueue_new_job(org, input(), "tester".into()).unwrap();
    let moved = store.move_to_position(a.id, 0).unwrap();
    assert_eq!(moved.order_in_queue, 0);
}

#[test]
fn reclaim_orphans_preserves_queue_slot() {
    let store = store();
    let org = OrgId::new();
    let job = store.enqueue_new_job(org, input(), "tester".into()).unwrap();
    let agent = dispatchd_core::AgentId::new();
    store.claim_next(org, QueueType::Backlog, agent).unwrap();

    let orphaned = store.reclaim_orphans(org, agent, 300_000).unwrap();
    assert_eq!(orphaned.len(), 1);
    assert_eq!(orphaned[0].id, job.id);
    assert_eq!(orphaned[0].status, JobStatus::Queued);
    assert_eq!(orphaned[0].agent_id, None);
    // queue_type/order_in_queue untouched (P6).
    assert_eq!(orphaned[0].queue_type, Some(QueueType::Backlog));
    assert_eq!(orphaned[0].order_in_queue, 0);
}

#[test]
fn in_progress_for_agent_finds_the_claimed_job() {
    let store = store();
    let org = OrgId::new();
    let job = store.enqueue_new_job(org, input(), "tester".into()).unwrap();
    let agent = dispatchd_core::AgentId::new();
    store.claim_next(org, QueueType::Backlog, agent).unwrap();
    let found = store.in_progress_for_agent(agent).unwrap();
    assert_eq!(found.id, job.id);
}

#[test]
fn open_retry_version_clears_logs_and_bumps_version() {
    let store = store();
    let org = OrgId::new();
    let job = store.create_job(org, input(), "tester".into());
    store.append_log(job.id, dispatchd_core::LogKind::Generation, "line 1".into()).unwrap();
    assert!(store.latest_job(job.id).unwrap().code_generation_logs.is_some());

    let retried = store.open_retry_version(job.id, "retry requested".into()).unwrap();
    assert_eq!(retried.version, 2);
    assert!(retried.code_generation_logs.is_none());
    assert!(retried.code_verification_logs.is_none());
    assert!(retried.updates.contains("retry requested"));
}

#[test]
fn ping_failures_mark_agent_offline_at_threshold() {
    let store = store();
    let org = OrgId::new();
    let (agent, prior) = store.register_agent(org, "agent-1".into(), "10.0.0.1".into(), 7700, None).unwrap();
    assert_eq!(prior, dispatchd_core::AgentStatus::Offline);
    assert_eq!(agent.status, dispatchd_core::AgentStatus::Active);

    for _ in 0..2 {
        let agent = store.ping_failed(agent.id).unwrap();
        assert_eq!(agent.status, dispatchd_core::AgentStatus::Active);
    }
    let agent = store.ping_failed(agent.id).unwrap();
    assert_eq!(agent.status, dispatchd_core::AgentStatus::Offline);
}

#[test]
fn heartbeat_resets_failure_counter() {
    let store = store();
    let org = OrgId::new();
    let (agent, _) = store.register_agent(org, "agent-1".into(), "10.0.0.1".into(), 7700, None).unwrap();
    store.ping_failed(agent.id).unwrap();
    store.heartbeat(agent.id).unwrap();
    let agent = store.get_agent(agent.id).unwrap();
    assert_eq!(agent.consecutive_failures, 0);
}

#[test]
fn register_agent_upserts_on_org_and_host() {
    let store = store();
    let org = OrgId::new();
    let (first, _) = store.register_agent(org, "agent-1".into(), "10.0.0.1".into(), 7700, None).unwrap();
    let (second, prior) = store.register_agent(org, "agent-1".into(), "10.0.0.1".into(), 7701, Some("1.2.3.4".into())).unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(prior, dispatchd_core::AgentStatus::Active);
    assert_eq!(second.port, 7701);
    assert_eq!(second.ip, Some("1.2.3.4".into()));
}

#[test]
fn queue_pause_defaults_false_and_toggles() {
    let store = store();
    let org = OrgId::new();
    assert!(!store.is_paused(org, QueueType::Backlog));
    store.set_paused(org, QueueType::Backlog, true).unwrap();
    assert!(store.is_paused(org, QueueType::Backlog));
    assert!(!store.is_paused(org, QueueType::Rework));
}

mod prop {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Enqueue,
        RemoveAt(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Enqueue), (0usize..8).prop_map(Op::RemoveAt),]
    }

    proptest! {
        /// P1: positions of latest-version queued rows always form `[0, n-1]`.
        #[test]
        fn positions_stay_contiguous(ops in prop::collection::vec(op_strategy(), 1..40)) {
            let store = store();
            let org = OrgId::new();
            let mut live: Vec<dispatchd_core::JobId> = Vec::new();

            for op in ops {
                match op {
                    Op::Enqueue => {
                        let job = store.enqueue_new_job(org, input(), "tester".into()).unwrap();
                        live.push(job.id);
                    }
                    Op::RemoveAt(idx) => {
                        if live.is_empty() {
                            continue;
                        }
                        let idx = idx % live.len();
                        let id = live.remove(idx);
                        if let Some((queue_type, position)) = store.remove_from_queue(id).unwrap() {
                            store.reprioritize_after_removal(org, queue_type, position).unwrap();
                        }
                    }
                }

                let mut positions: Vec<i64> = live.iter().map(|id| store.latest_job(*id).unwrap().order_in_queue).collect();
                positions.sort_unstable();
                let expected: Vec<i64> = (0..positions.len() as i64).collect();
                prop_assert_eq!(positions, expected);
            }
        }
    }
}
