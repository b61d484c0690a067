// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/agents` routes (§6). Agent rows are created by the agent's own
//! `RegisterAgent` gRPC call ([`crate::grpc`]); this surface only reads,
//! removes, and reconnects them.

use crate::app::AppState;
use crate::auth::AuthedOrg;
use crate::error::ApiError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use dispatchd_adapters::AgentAdapter;
use dispatchd_core::{Agent, AgentId, Clock};
use dispatchd_engine::{Pinger, RuntimeError};
use dispatchd_storage::{StoreError, Wal};
use serde::Deserialize;
use std::time::Duration;

pub async fn list<C, W, A, P>(State(state): State<AppState<C, W, A, P>>, AuthedOrg(org_id): AuthedOrg) -> Json<Vec<Agent>>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    Json(state.runtime.store().agents_for_org(org_id))
}

fn authorized_agent<C, W, A, P>(state: &AppState<C, W, A, P>, org_id: dispatchd_core::OrgId, agent_id: AgentId) -> Result<Agent, ApiError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    let agent = state.runtime.store().get_agent(agent_id).ok_or_else(|| RuntimeError::from(StoreError::AgentNotFound(agent_id.to_string())))?;
    if agent.org_id != org_id {
        return Err(RuntimeError::from(StoreError::AgentNotFound(agent_id.to_string())).into());
    }
    Ok(agent)
}

pub async fn get_one<C, W, A, P>(
    State(state): State<AppState<C, W, A, P>>,
    AuthedOrg(org_id): AuthedOrg,
    Path(id): Path<String>,
) -> Result<Json<Agent>, ApiError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    Ok(Json(authorized_agent(&state, org_id, AgentId::from(id.as_str()))?))
}

pub async fn remove<C, W, A, P>(
    State(state): State<AppState<C, W, A, P>>,
    AuthedOrg(org_id): AuthedOrg,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    let agent_id = AgentId::from(id.as_str());
    authorized_agent(&state, org_id, agent_id)?;
    state.runtime.stop_agent(agent_id);
    state.runtime.store().remove_agent(agent_id).map_err(RuntimeError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ReconnectRequest {
    #[serde(default)]
    pub ping_timeout_secs: Option<u64>,
}

pub async fn reconnect<C, W, A, P>(
    State(state): State<AppState<C, W, A, P>>,
    AuthedOrg(org_id): AuthedOrg,
    Path(id): Path<String>,
    Json(body): Json<ReconnectRequest>,
) -> Result<Json<Agent>, ApiError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    let agent_id = AgentId::from(id.as_str());
    authorized_agent(&state, org_id, agent_id)?;
    let timeout = Duration::from_secs(body.ping_timeout_secs.unwrap_or(10));
    state.runtime.reconnect_agent(agent_id, timeout).await?;
    let agent = authorized_agent(&state, org_id, agent_id)?;
    Ok(Json(agent))
}
