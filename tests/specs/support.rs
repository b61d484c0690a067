// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the §8 scenario tests, mirroring the teacher-derived
//! idiom already used by each engine module's own `#[cfg(test)]` blocks.

use dispatchd_core::{AgentId, FakeClock, OrgId, UserInput};
use dispatchd_storage::{MaterializedState, NullWal, Store};
use std::time::Duration;

pub fn store() -> Store<FakeClock, NullWal> {
    Store::new(FakeClock::new(), NullWal, MaterializedState::default())
}

/// A store plus a handle to the same [`FakeClock`] it was built with, so a
/// scenario can advance time and observe the effect through the store.
pub fn store_with_clock() -> (Store<FakeClock, NullWal>, FakeClock) {
    let clock = FakeClock::new();
    (Store::new(clock.clone(), NullWal, MaterializedState::default()), clock)
}

pub fn input() -> UserInput {
    UserInput { source: "api".into(), prompt: "do it".into(), source_metadata: serde_json::Value::Null }
}

pub fn register_agent(store: &Store<FakeClock, NullWal>, org_id: OrgId, name: &str) -> AgentId {
    let (agent, _) = store.register_agent(org_id, name.to_string(), "127.0.0.1".into(), 7700, None).unwrap();
    agent.id
}

/// A `Pinger` that never fails, for scenarios exercising `Runtime` without
/// caring about health-check behavior.
pub struct AlwaysOkPinger;

#[async_trait::async_trait]
impl dispatchd_engine::health_check::Pinger for AlwaysOkPinger {
    async fn ping(&self, _agent_id: AgentId, _ack_timeout: Duration) -> Result<(), dispatchd_engine::RuntimeError> {
        Ok(())
    }
}
