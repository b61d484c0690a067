// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/queues/:queue_type/{pause,resume,status}` routes (§6).

use crate::app::AppState;
use crate::auth::AuthedOrg;
use crate::error::ApiError;
use axum::extract::{Path, State};
use dispatchd_adapters::AgentAdapter;
use dispatchd_core::{Clock, QueueType};
use dispatchd_engine::{Pinger, RuntimeError};
use dispatchd_storage::Wal;
use serde::Serialize;

fn parse_queue_type(raw: &str) -> Result<QueueType, ApiError> {
    match raw {
        "backlog" => Ok(QueueType::Backlog),
        "rework" => Ok(QueueType::Rework),
        other => Err(ApiError::BadRequest(format!("unknown queue type {other:?}"))),
    }
}

pub async fn pause<C, W, A, P>(
    State(state): State<AppState<C, W, A, P>>,
    AuthedOrg(org_id): AuthedOrg,
    Path(queue_type): Path<String>,
) -> Result<(), ApiError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    let queue_type = parse_queue_type(&queue_type)?;
    state.runtime.store().set_paused(org_id, queue_type, true).map_err(RuntimeError::from)?;
    Ok(())
}

pub async fn resume<C, W, A, P>(
    State(state): State<AppState<C, W, A, P>>,
    AuthedOrg(org_id): AuthedOrg,
    Path(queue_type): Path<String>,
) -> Result<(), ApiError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    let queue_type = parse_queue_type(&queue_type)?;
    state.runtime.store().set_paused(org_id, queue_type, false).map_err(RuntimeError::from)?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct QueueStatus {
    pub is_paused: bool,
}

pub async fn status<C, W, A, P>(
    State(state): State<AppState<C, W, A, P>>,
    AuthedOrg(org_id): AuthedOrg,
    Path(queue_type): Path<String>,
) -> Result<axum::Json<QueueStatus>, ApiError>
where
    C: Clock,
    W: Wal,
    A: AgentAdapter,
    P: Pinger,
{
    let queue_type = parse_queue_type(&queue_type)?;
    Ok(axum::Json(QueueStatus { is_paused: state.runtime.store().is_paused(org_id, queue_type) }))
}
