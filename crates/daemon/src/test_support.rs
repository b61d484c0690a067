// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for the REST/gRPC unit tests: a fake `Pinger` (mirroring
//! `dispatchd-engine::health_check`'s own test double) plus a builder for a
//! fully in-memory [`AppState`].

use crate::app::AppState;
use crate::auth::ApiKeyTable;
use dispatchd_adapters::FakeAdapter;
use dispatchd_core::config::ApiKeyEntry;
use dispatchd_core::{AgentId, FakeClock, OrgId};
use dispatchd_engine::{Pinger, Runtime, RuntimeError};
use dispatchd_storage::{MaterializedState, NullWal, Store};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
pub struct FakePinger;

#[async_trait::async_trait]
impl Pinger for FakePinger {
    async fn ping(&self, _agent_id: AgentId, _ack_timeout: Duration) -> Result<(), RuntimeError> {
        Ok(())
    }
}

pub type TestState = AppState<FakeClock, NullWal, FakeAdapter, FakePinger>;

/// An `AppState` over a fresh in-memory store, with one API key
/// (`"test-key"`) resolving to `org_id`.
pub fn test_state(org_id: OrgId) -> TestState {
    let store = Arc::new(Store::new(FakeClock::new(), NullWal, MaterializedState::default()));
    let runtime = Arc::new(Runtime::new(
        store,
        Arc::new(FakeAdapter::new()),
        Arc::new(FakePinger),
        Duration::from_secs(60),
        Duration::from_secs(30),
        Duration::from_secs(5),
        Duration::from_secs(300),
        Duration::from_secs(300),
    ));
    let auth = ApiKeyTable::new(&[ApiKeyEntry { api_key: "test-key".to_string(), org_id: org_id.to_string() }]);
    AppState { runtime, auth }
}
