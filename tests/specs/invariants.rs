// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property-based checks for a subset of §8's universal invariants that
//! don't require the async engine harness: P1 (contiguous positions), P4
//! (reprioritize is a permutation), and P7 (retry clears logs).

use crate::support::{input, store};
use dispatchd_core::{JobStatus, OrgId, QueueType, UserAcceptanceStatus};
use dispatchd_engine::reprioritize::{self, JobPatch};
use proptest::prelude::*;

fn queued_positions(store: &dispatchd_storage::Store<dispatchd_core::FakeClock, dispatchd_storage::NullWal>, org_id: OrgId) -> Vec<i64> {
    let mut positions: Vec<i64> =
        store.jobs_for_org(org_id).into_iter().filter(|j| j.is_queued() && j.queue_type == Some(QueueType::Backlog)).map(|j| j.order_in_queue).collect();
    positions.sort_unstable();
    positions
}

proptest! {
    /// P1: after enqueuing any number of jobs, backlog positions are exactly
    /// `{0, ..., n-1}`.
    #[test]
    fn p1_positions_are_contiguous_after_enqueue(count in 1usize..12) {
        let store = store();
        let org_id = OrgId::new();
        for _ in 0..count {
            store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
        }
        prop_assert_eq!(queued_positions(&store, org_id), (0..count as i64).collect::<Vec<_>>());
    }

    /// P4: `move_to_position` is a permutation of the existing queue — same
    /// set of jobs, positions re-packed into `[0, n-1]`, target job clamped
    /// to the requested position.
    #[test]
    fn p4_reprioritize_is_a_permutation(count in 2usize..10, target_index in 0usize..9, requested in -5i64..20) {
        let store = store();
        let org_id = OrgId::new();
        let jobs: Vec<_> = (0..count).map(|_| store.enqueue_new_job(org_id, input(), "tester".into()).unwrap()).collect();
        let target = &jobs[target_index % count];

        let before_ids: std::collections::HashSet<_> = store.jobs_for_org(org_id).into_iter().filter(|j| j.is_queued()).map(|j| j.id).collect();

        let moved = reprioritize::reprioritize(&store, target.id, requested).unwrap();

        let after_ids: std::collections::HashSet<_> = store.jobs_for_org(org_id).into_iter().filter(|j| j.is_queued()).map(|j| j.id).collect();
        prop_assert_eq!(before_ids, after_ids);
        prop_assert_eq!(queued_positions(&store, org_id), (0..count as i64).collect::<Vec<_>>());
        prop_assert_eq!(moved.order_in_queue, requested.clamp(0, count as i64 - 1));
    }

    /// P7: any PUT that satisfies the retry predicate (requeue to rework
    /// with a comment) yields a version whose logs are empty, regardless of
    /// how much log text the prior version had accumulated.
    #[test]
    fn p7_retry_clears_logs(generation_lines in 0usize..6, verification_lines in 0usize..6, comment in "[a-z ]{1,40}") {
        let store = store();
        let org_id = OrgId::new();
        let job = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
        for i in 0..generation_lines {
            store.append_log(job.id, dispatchd_core::LogKind::Generation, format!("line {i}")).unwrap();
        }
        for i in 0..verification_lines {
            store.append_log(job.id, dispatchd_core::LogKind::Verification, format!("line {i}")).unwrap();
        }
        store.set_status(job.id, JobStatus::Failed).unwrap();
        store.set_acceptance(job.id, UserAcceptanceStatus::ReviewedAndAskedRework).unwrap();

        let patch = JobPatch {
            status: Some(JobStatus::Queued),
            queue_type: Some(QueueType::Rework),
            user_comment: Some(comment),
            ..Default::default()
        };
        let retried = reprioritize::apply_put(&store, job.id, patch).unwrap();

        prop_assert!(retried.code_generation_logs.is_none());
        prop_assert!(retried.code_verification_logs.is_none());
        prop_assert_eq!(retried.version, 2);
    }
}
