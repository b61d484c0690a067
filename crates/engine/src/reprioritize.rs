// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reprioritization & Rework Transitions (§4.8): the orchestrated state
//! change behind `PUT /jobs/:id` and `POST /jobs/:id/reprioritize`.

use crate::error::RuntimeError;
use dispatchd_core::{Clock, Job, JobId, JobStatus, QueueType, RepoId, UserAcceptanceStatus};
use dispatchd_storage::{StoreError, Wal};
use serde::Deserialize;

/// The subset of `PUT /jobs/:id`'s body this orchestration acts on. Only one
/// `user_comment` is modeled per call, matching the REST handler appending
/// one comment per request rather than replacing the whole `user_comments`
/// vector. Deserialized straight from the request body: an absent field
/// means "leave unchanged", `repo_id: null` means "clear the repo".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPatch {
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub queue_type: Option<QueueType>,
    #[serde(default)]
    pub user_acceptance_status: Option<UserAcceptanceStatus>,
    #[serde(default)]
    pub user_comment: Option<String>,
    #[serde(default)]
    pub repo_id: Option<Option<RepoId>>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Applies one `PUT /jobs/:id` per §4.8's orchestration rules to the
/// latest version of `job_id`.
pub fn apply_put<C: Clock, W: Wal>(store: &dispatchd_storage::Store<C, W>, job_id: JobId, patch: JobPatch) -> Result<Job, RuntimeError> {
    let mut job = store.latest_job(job_id).ok_or_else(|| StoreError::JobNotFound(job_id.to_string()))?;
    let prior_status = job.status;
    let prior_acceptance = job.user_acceptance_status;

    if let Some(new_status) = patch.status {
        if prior_status == JobStatus::Queued && new_status == JobStatus::InProgress {
            return Err(RuntimeError::ForbiddenTransition("queued -> in-progress via PUT /jobs/:id is forbidden".into()));
        }
    }

    // Versioning rule (§3): work out up front whether this PUT opens a new
    // version row rather than mutating the latest version in place.
    let prompt_changed = patch.prompt.as_deref().is_some_and(|p| p != job.user_input.prompt);
    let repo_changed = patch.repo_id.is_some_and(|new_repo| new_repo != job.repo_id);
    let target_acceptance = patch.user_acceptance_status.unwrap_or(prior_acceptance);
    let acceptance_to_rework = target_acceptance == UserAcceptanceStatus::ReviewedAndAskedRework && prior_acceptance != UserAcceptanceStatus::ReviewedAndAskedRework;
    let retry_target_queue = patch.queue_type.unwrap_or(if target_acceptance == UserAcceptanceStatus::ReviewedAndAskedRework {
        QueueType::Rework
    } else {
        QueueType::Backlog
    });
    let retry_requested =
        patch.status == Some(JobStatus::Queued) && prior_status != JobStatus::Queued && retry_target_queue == QueueType::Rework && patch.user_comment.is_some();

    if let Some(comment) = patch.user_comment.clone() {
        job = store.add_comment(job_id, comment)?;
    }

    // The retry trigger opens its own version further down (it also clears
    // logs, per P7); the other three triggers share a plain version bump
    // here so every later branch in this function operates on it.
    if !retry_requested && Job::needs_new_version(prompt_changed, repo_changed, acceptance_to_rework, false) {
        let mut causes = Vec::new();
        if prompt_changed {
            causes.push("prompt changed");
        }
        if repo_changed {
            causes.push("repo changed");
        }
        if acceptance_to_rework {
            causes.push("acceptance set to reviewed_and_asked_rework");
        }
        job = store.open_version(job_id, format!("new version opened: {}", causes.join(", ")))?;
    }

    if prompt_changed {
        job = store.set_prompt(job_id, patch.prompt.clone().unwrap_or_default())?;
    }

    if patch.status == Some(JobStatus::InReview) && prior_status == JobStatus::Queued && job.queue_type.is_some() {
        if let Some((queue_type, position)) = store.remove_from_queue(job_id)? {
            store.reprioritize_after_removal(job.org_id, queue_type, position)?;
        }
        job = store.latest_job(job_id).ok_or_else(|| StoreError::JobNotFound(job_id.to_string()))?;
    }

    if let Some(new_acceptance) = patch.user_acceptance_status {
        if new_acceptance == UserAcceptanceStatus::ReviewedAndAskedRework && prior_acceptance != new_acceptance {
            if job.queue_type == Some(QueueType::Backlog) {
                if let Some((queue_type, position)) = store.remove_from_queue(job_id)? {
                    store.reprioritize_after_removal(job.org_id, queue_type, position)?;
                }
            }
            job = store.insert_at_tail(job_id, QueueType::Rework)?;
        } else if new_acceptance == UserAcceptanceStatus::NotReviewed
            && prior_acceptance == UserAcceptanceStatus::ReviewedAndAskedRework
            && job.is_queued()
        {
            if let Some((queue_type, position)) = store.remove_from_queue(job_id)? {
                store.reprioritize_after_removal(job.org_id, queue_type, position)?;
            }
            job = store.insert_at_tail(job_id, QueueType::Backlog)?;
        }
        job = store.set_acceptance(job_id, new_acceptance)?;
    }

    if let Some(new_status) = patch.status {
        if new_status == JobStatus::Queued && prior_status != JobStatus::Queued {
            let target_queue = patch.queue_type.unwrap_or(if job.user_acceptance_status == UserAcceptanceStatus::ReviewedAndAskedRework {
                QueueType::Rework
            } else {
                QueueType::Backlog
            });
            let is_retry = target_queue == QueueType::Rework && patch.user_comment.is_some();
            if is_retry {
                let last_comment = job.user_comments.last().cloned().unwrap_or_default();
                job = store.open_retry_version(job_id, format!("retry requested: {last_comment}"))?;
            }
            job = store.insert_at_tail(job_id, target_queue)?;
            job = store.set_status(job_id, JobStatus::Queued)?;
        } else if new_status != JobStatus::InReview || prior_status != JobStatus::Queued {
            job = store.set_status(job_id, new_status)?;
        } else {
            job = store.set_status(job_id, new_status)?;
        }
    }

    if let Some(repo_patch) = patch.repo_id {
        job = store.set_repo(job_id, repo_patch)?;
    }

    Ok(job)
}

/// `POST /jobs/:id/reprioritize {position}`: only valid for `status =
/// queued`. `position` is clamped to `[0, n-1]` by `Store::move_to_position`.
pub fn reprioritize<C: Clock, W: Wal>(store: &dispatchd_storage::Store<C, W>, job_id: JobId, position: i64) -> Result<Job, RuntimeError> {
    let job = store.latest_job(job_id).ok_or_else(|| StoreError::JobNotFound(job_id.to_string()))?;
    if job.status != JobStatus::Queued {
        return Err(RuntimeError::ForbiddenTransition(format!("job {job_id} is not queued")));
    }
    Ok(store.move_to_position(job_id, position)?)
}
