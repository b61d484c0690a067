// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/jobs` routes (§6).

use crate::app::AppState;
use crate::error::ApiError;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use dispatchd_adapters::AgentAdapter;
use dispatchd_core::{AgentId, Clock, Job, JobId, RepoId, UserInput};
use dispatchd_engine::{JobPatch, Pinger, RuntimeError};
use dispatchd_storage::{StoreError, Wal};
use crate::auth::AuthedOrg;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub prompt: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub repo_id: Option<String>,
}

pub async fn create<C, W, A, P>(
    State(state): State<AppState<C, W, A, P>>,
    AuthedOrg(org_id): AuthedOrg,
    Json(body): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), ApiError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    let user_input = UserInput {
        source: body.source.unwrap_or_else(|| "api".to_string()),
        prompt: body.prompt,
        source_metadata: body.source_metadata.unwrap_or(serde_json::Value::Null),
    };
    let store = state.runtime.store();
    let mut job = store.enqueue_new_job(org_id, user_input, "api".to_string()).map_err(RuntimeError::from)?;
    if let Some(repo_id) = body.repo_id {
        job = store.set_repo(job.id, Some(RepoId::from(repo_id.as_str()))).map_err(RuntimeError::from)?;
    }
    store.record_activity(job.id, org_id, "job_created", "job created via REST", "api");
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn list<C, W, A, P>(State(state): State<AppState<C, W, A, P>>, AuthedOrg(org_id): AuthedOrg) -> Json<Vec<Job>>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    Json(state.runtime.store().jobs_for_org(org_id))
}

#[derive(Debug, Deserialize)]
pub struct GetJobQuery {
    pub version: Option<u32>,
}

pub async fn get_one<C, W, A, P>(
    State(state): State<AppState<C, W, A, P>>,
    AuthedOrg(org_id): AuthedOrg,
    Path(id): Path<String>,
    Query(query): Query<GetJobQuery>,
) -> Result<Json<Job>, ApiError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    let job_id = JobId::from(id.as_str());
    let job = match query.version {
        Some(version) => state.runtime.store().job_version(job_id, version),
        None => state.runtime.store().latest_job(job_id),
    }
    .ok_or_else(|| RuntimeError::from(StoreError::JobNotFound(job_id.to_string())))?;
    if job.org_id != org_id {
        return Err(RuntimeError::from(StoreError::JobNotFound(job_id.to_string())).into());
    }
    Ok(Json(job))
}

pub async fn update<C, W, A, P>(
    State(state): State<AppState<C, W, A, P>>,
    AuthedOrg(org_id): AuthedOrg,
    Path(id): Path<String>,
    Json(patch): Json<JobPatch>,
) -> Result<Json<Job>, ApiError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    let job_id = JobId::from(id.as_str());
    authorize(&state, org_id, job_id)?;
    let job = state.runtime.apply_put(job_id, patch)?;
    state.runtime.store().record_activity(job_id, org_id, "job_updated", "job updated via REST", "api");
    Ok(Json(job))
}

pub async fn archive<C, W, A, P>(
    State(state): State<AppState<C, W, A, P>>,
    AuthedOrg(org_id): AuthedOrg,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    let job_id = JobId::from(id.as_str());
    let job = authorize(&state, org_id, job_id)?;
    if job.status == dispatchd_core::JobStatus::Archived {
        return Err(ApiError::BadRequest(format!("job {job_id} is already archived")));
    }
    let archived = state.runtime.store().set_status(job_id, dispatchd_core::JobStatus::Archived).map_err(RuntimeError::from)?;
    state.runtime.store().record_activity(job_id, org_id, "job_archived", "job archived via REST", "api");
    Ok(Json(archived))
}

#[derive(Debug, Deserialize)]
pub struct ExecuteJobRequest {
    pub agent_id: String,
}

pub async fn execute<C, W, A, P>(
    State(state): State<AppState<C, W, A, P>>,
    AuthedOrg(org_id): AuthedOrg,
    Path(id): Path<String>,
    Json(body): Json<ExecuteJobRequest>,
) -> Result<(StatusCode, Json<Job>), ApiError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    let job_id = JobId::from(id.as_str());
    authorize(&state, org_id, job_id)?;
    let agent_id = AgentId::from(body.agent_id.as_str());
    let job = state.runtime.execute_now(job_id, agent_id)?;
    state.runtime.store().record_activity(job_id, org_id, "job_executed", "manual dispatch via REST", "api");
    Ok((StatusCode::ACCEPTED, Json(job)))
}

#[derive(Debug, Deserialize)]
pub struct ReprioritizeRequest {
    pub position: i64,
}

pub async fn reprioritize<C, W, A, P>(
    State(state): State<AppState<C, W, A, P>>,
    AuthedOrg(org_id): AuthedOrg,
    Path(id): Path<String>,
    Json(body): Json<ReprioritizeRequest>,
) -> Result<Json<Job>, ApiError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    if body.position < 0 {
        return Err(ApiError::BadRequest("position must be >= 0".to_string()));
    }
    let job_id = JobId::from(id.as_str());
    authorize(&state, org_id, job_id)?;
    let job = state.runtime.reprioritize(job_id, body.position)?;
    state.runtime.store().record_activity(job_id, org_id, "job_reprioritized", format!("moved to position {}", body.position), "api");
    Ok(Json(job))
}

fn authorize<C, W, A, P>(state: &AppState<C, W, A, P>, org_id: dispatchd_core::OrgId, job_id: JobId) -> Result<Job, ApiError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    let job = state.runtime.store().latest_job(job_id).ok_or_else(|| RuntimeError::from(StoreError::JobNotFound(job_id.to_string())))?;
    if job.org_id != org_id {
        return Err(RuntimeError::from(StoreError::JobNotFound(job_id.to_string())).into());
    }
    Ok(job)
}
