// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! REST Façade (§4.11, §6): a thin `axum` router over the core's typed
//! operations. Every route requires a bearer token resolved by
//! [`crate::auth::AuthedOrg`].

pub mod agents;
pub mod jobs;
pub mod queues;

use crate::app::AppState;
use axum::routing::{get, post};
use axum::Router;
use dispatchd_adapters::AgentAdapter;
use dispatchd_core::Clock;
use dispatchd_engine::Pinger;
use dispatchd_storage::Wal;

pub fn router<C, W, A, P>(state: AppState<C, W, A, P>) -> Router
where
    C: Clock + 'static,
    W: Wal + 'static,
    A: AgentAdapter + 'static,
    P: Pinger + 'static,
{
    Router::new()
        .route("/jobs", post(jobs::create).get(jobs::list))
        .route("/jobs/{id}", get(jobs::get_one).put(jobs::update).delete(jobs::archive))
        .route("/jobs/{id}/execute", post(jobs::execute))
        .route("/jobs/{id}/reprioritize", post(jobs::reprioritize))
        .route("/agents", get(agents::list))
        .route("/agents/{id}", get(agents::get_one).delete(agents::remove))
        .route("/agents/{id}/reconnect", post(agents::reconnect))
        .route("/queues/{queue_type}/pause", post(queues::pause))
        .route("/queues/{queue_type}/resume", post(queues::resume))
        .route("/queues/{queue_type}/status", get(queues::status))
        .with_state(state)
}
