// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared state for the REST façade and the gRPC server: the `Runtime` plus
//! the bearer-token table, generic over the same `{Clock, Wal, AgentAdapter,
//! Pinger}` quartet as `dispatchd-engine::Runtime` so tests can swap in
//! fakes (`FakeClock`/`NullWal`/`FakeAdapter`/a fake `Pinger`).

use crate::auth::ApiKeyTable;
use dispatchd_adapters::AgentAdapter;
use dispatchd_core::Clock;
use dispatchd_engine::{Pinger, Runtime};
use dispatchd_storage::Wal;
use std::sync::Arc;

pub struct AppState<C: Clock, W: Wal, A: AgentAdapter, P: Pinger> {
    pub runtime: Arc<Runtime<C, W, A, P>>,
    pub auth: ApiKeyTable,
}

impl<C: Clock, W: Wal, A: AgentAdapter, P: Pinger> Clone for AppState<C, W, A, P> {
    fn clone(&self) -> Self {
        Self { runtime: self.runtime.clone(), auth: self.auth.clone() }
    }
}

impl<C: Clock, W: Wal, A: AgentAdapter, P: Pinger> axum::extract::FromRef<AppState<C, W, A, P>> for ApiKeyTable {
    fn from_ref(state: &AppState<C, W, A, P>) -> Self {
        state.auth.clone()
    }
}
