// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job-Execution Workflow (§4.6, C7): the linear activity sequence run once
//! a job has been claimed off a queue.

use crate::error::RuntimeError;
use dispatchd_adapters::AgentAdapter;
use dispatchd_core::{AgentId, Clock, JobId, JobStatus, LogKind};
use dispatchd_storage::Wal;
use futures_util::StreamExt;
use std::future::Future;
use std::time::Duration;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;

/// §4.6's per-activity retry policy: initial 1s, max interval 30s, max 3
/// attempts, short-circuited on a non-retriable cause.
async fn retry_activity<T, F, Fut>(mut activity: F) -> Result<T, RuntimeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RuntimeError>>,
{
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match activity().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= MAX_ATTEMPTS || !err.is_retriable() => return Err(err),
            Err(err) => {
                tracing::warn!(attempt, error = %err, "activity failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

/// Runs the full §4.6 sequence for `job_id`, already claimed onto `agent_id`.
/// Never returns an error: any failure is surfaced by writing `status =
/// failed` and an `updates` line, per "Error surfacing" in §4.6.
pub async fn run<C, W, A>(
    store: &dispatchd_storage::Store<C, W>,
    adapter: &A,
    agent_id: AgentId,
    job_id: JobId,
    heartbeat_timeout: Duration,
) -> Result<(), RuntimeError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
{
    let job = store.latest_job(job_id).ok_or_else(|| dispatchd_storage::StoreError::JobNotFound(job_id.to_string()))?;

    let result = run_activities(store, adapter, agent_id, &job, heartbeat_timeout).await;

    // Step 4: cleanup always runs, even on failure, in the terminal block.
    if let Err(err) = adapter.cleanup_workspace(agent_id, job_id).await {
        tracing::warn!(%job_id, error = %err, "cleanup_workspace failed");
    }

    match result {
        Ok(()) => {
            store.set_status(job_id, JobStatus::Completed)?;
            store.append_update(job_id, "job execution completed".to_string())?;
        }
        Err(err) => {
            store.set_status(job_id, JobStatus::Failed)?;
            store.append_update(job_id, format!("job execution failed: {err}"))?;
        }
    }

    Ok(())
}

async fn run_activities<C, W, A>(
    store: &dispatchd_storage::Store<C, W>,
    adapter: &A,
    agent_id: AgentId,
    job: &dispatchd_core::Job,
    heartbeat_timeout: Duration,
) -> Result<(), RuntimeError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
{
    let job_id = job.id;

    // Step 1: execute_job, streaming log frames into the Log Sink (§4.9).
    // Each frame arrival resets the heartbeat clock; silence longer than
    // `heartbeat_timeout` cancels the in-flight run and retries the whole
    // activity from scratch (§4.6, §7 "Heartbeat timeout").
    let prompt = job.user_input.prompt.clone();
    let repo_id = job.repo_id;
    retry_activity(|| {
        let prompt = prompt.clone();
        async move {
            let mut stream = adapter.execute_job(agent_id, job_id, prompt, repo_id, String::new()).await?;
            loop {
                match tokio::time::timeout(heartbeat_timeout, stream.next()).await {
                    Ok(Some(frame)) => {
                        let frame = frame?;
                        store.append_log(job_id, LogKind::Generation, frame.message)?;
                    }
                    Ok(None) => return Ok(()),
                    Err(_elapsed) => {
                        if let Err(err) = adapter.cancel_job(agent_id, job_id).await {
                            tracing::warn!(%job_id, error = %err, "cancel_job after heartbeat timeout failed");
                        }
                        return Err(RuntimeError::Timeout(heartbeat_timeout));
                    }
                }
            }
        }
    })
    .await?;

    // Step 2: run_verification.
    let verification = retry_activity(|| async { Ok(adapter.run_verification(agent_id, job_id).await?) }).await?;
    store.append_log(job_id, LogKind::Verification, format!("verification success={}", verification.success))?;
    store.set_confidence(job_id, verification.confidence_score)?;

    if !verification.success {
        return Err(RuntimeError::ActivityFailed(format!("job {job_id} failed verification")));
    }

    // Step 3: create_pr, only when a repo was provided and verification succeeded.
    if let Some(repo_id) = repo_id {
        let branch = format!("dispatchd/{job_id}");
        let title = format!("dispatchd job {job_id}");
        let body = job.updates.clone();
        let pr_link =
            retry_activity(|| async { Ok(adapter.create_pr(agent_id, job_id, repo_id, branch.clone(), title.clone(), body.clone()).await?) })
                .await?;
        store.set_pr_link(job_id, pr_link)?;
    }

    Ok(())
}
