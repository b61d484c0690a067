// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job and queue event handlers (§3 job rows, §4.1 queue model).

use super::MaterializedState;
use dispatchd_core::{Event, JobId};

fn upsert_version(state: &mut MaterializedState, job_id: JobId, version: u32, job: dispatchd_core::Job) {
    state
        .latest_version
        .entry(job_id)
        .and_modify(|v| {
            if version > *v {
                *v = version;
            }
        })
        .or_insert(version);
    state.jobs.insert((job_id, version), job);
}

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::JobCreated { job } | Event::JobNewVersionOpened { job } => {
            upsert_version(state, job.id, job.version, (**job).clone());
        }

        Event::JobClaimed { job_id, version, agent_id, at_ms } => {
            if let Some(job) = state.jobs.get_mut(&(*job_id, *version)) {
                job.status = dispatchd_core::JobStatus::InProgress;
                job.agent_id = Some(*agent_id);
                job.updated_at_ms = *at_ms;
            }
        }

        Event::JobOrphaned { job_id, version, at_ms } => {
            if let Some(job) = state.jobs.get_mut(&(*job_id, *version)) {
                job.status = dispatchd_core::JobStatus::Queued;
                job.agent_id = None;
                job.updated_at_ms = *at_ms;
            }
        }

        Event::JobQueuePositionSet { job_id, version, queue_type, position, at_ms } => {
            if let Some(job) = state.jobs.get_mut(&(*job_id, *version)) {
                job.queue_type = *queue_type;
                job.order_in_queue = *position;
                job.updated_at_ms = *at_ms;
            }
        }

        Event::JobStatusSet { job_id, version, status, at_ms } => {
            if let Some(job) = state.jobs.get_mut(&(*job_id, *version)) {
                job.status = *status;
                job.updated_at_ms = *at_ms;
            }
        }

        Event::JobAcceptanceSet { job_id, version, acceptance, at_ms } => {
            if let Some(job) = state.jobs.get_mut(&(*job_id, *version)) {
                job.user_acceptance_status = *acceptance;
                job.updated_at_ms = *at_ms;
            }
        }

        Event::JobPrioritySet { job_id, version, priority } => {
            if let Some(job) = state.jobs.get_mut(&(*job_id, *version)) {
                job.priority = *priority;
            }
        }

        Event::JobCommentAdded { job_id, version, comment, at_ms } => {
            if let Some(job) = state.jobs.get_mut(&(*job_id, *version)) {
                job.user_comments.push(comment.clone());
                job.updated_at_ms = *at_ms;
            }
        }

        Event::JobPrLinked { job_id, version, pr_link, at_ms } => {
            if let Some(job) = state.jobs.get_mut(&(*job_id, *version)) {
                job.pr_link = Some(pr_link.clone());
                job.updated_at_ms = *at_ms;
            }
        }

        Event::JobConfidenceSet { job_id, version, confidence_score } => {
            if let Some(job) = state.jobs.get_mut(&(*job_id, *version)) {
                job.confidence_score = Some(*confidence_score);
            }
        }

        Event::JobLogAppended { job_id, version, kind, line } => {
            if let Some(job) = state.jobs.get_mut(&(*job_id, *version)) {
                let series = match kind {
                    dispatchd_core::LogKind::Generation => &mut job.code_generation_logs,
                    dispatchd_core::LogKind::Verification => &mut job.code_verification_logs,
                };
                match series {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(line);
                    }
                    None => *series = Some(line.clone()),
                }
            }
        }

        Event::JobLogsCleared { job_id, version } => {
            if let Some(job) = state.jobs.get_mut(&(*job_id, *version)) {
                job.clear_logs();
            }
        }

        Event::JobUpdateAppended { job_id, version, line, at_ms } => {
            if let Some(job) = state.jobs.get_mut(&(*job_id, *version)) {
                job.append_update(*at_ms, line);
            }
        }

        Event::JobRepoSet { job_id, version, repo_id } => {
            if let Some(job) = state.jobs.get_mut(&(*job_id, *version)) {
                job.repo_id = *repo_id;
            }
        }

        Event::JobPromptSet { job_id, version, prompt } => {
            if let Some(job) = state.jobs.get_mut(&(*job_id, *version)) {
                job.user_input.prompt = prompt.clone();
            }
        }

        _ => {}
    }
}
