// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 6 (spec.md §8): retrying a failed, rework-flagged job opens a
//! fresh version with empty logs and an audit line quoting the comment.

use crate::support::{input, store};
use dispatchd_core::{JobStatus, LogKind, OrgId, QueueType, UserAcceptanceStatus};
use dispatchd_engine::reprioritize::{self, JobPatch};

#[test]
fn retry_opens_a_new_version_with_empty_logs_and_an_audit_line() {
    let store = store();
    let org_id = OrgId::new();
    let job = store.enqueue_new_job(org_id, input(), "tester".into()).unwrap();
    store.append_log(job.id, LogKind::Generation, "wrote the handler".into()).unwrap();
    store.append_log(job.id, LogKind::Verification, "verification success=true".into()).unwrap();
    store.set_status(job.id, JobStatus::Failed).unwrap();
    store.set_acceptance(job.id, UserAcceptanceStatus::ReviewedAndAskedRework).unwrap();

    let before = store.latest_job(job.id).unwrap();
    assert!(before.code_generation_logs.is_some());
    assert_eq!(before.version, 1);

    let patch = JobPatch {
        status: Some(JobStatus::Queued),
        queue_type: Some(QueueType::Rework),
        user_comment: Some("please handle the empty-input case".into()),
        ..Default::default()
    };
    let retried = reprioritize::apply_put(&store, job.id, patch).unwrap();

    assert_eq!(retried.version, 2);
    assert_eq!(retried.status, JobStatus::Queued);
    assert_eq!(retried.queue_type, Some(QueueType::Rework));
    assert_eq!(retried.order_in_queue, 0);
    assert!(retried.code_generation_logs.is_none());
    assert!(retried.code_verification_logs.is_none());
    assert!(retried.updates.contains("please handle the empty-input case"));
    assert!(retried.user_comments.iter().any(|c| c == "please handle the empty-input case"));
}
