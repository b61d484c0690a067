// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 5 (spec.md §8): three consecutive unacknowledged health-check
//! firings mark an agent offline and pause both of its schedules.

use crate::support::register_agent;
use dispatchd_adapters::FakeAdapter;
use dispatchd_core::{AgentId, AgentStatus, FakeClock, OrgId};
use dispatchd_engine::health_check::Pinger;
use dispatchd_engine::{RuntimeError, ScheduleState};
use dispatchd_storage::{MaterializedState, NullWal, Store};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Blocks the agent's stream: every ping times out, as if the connection
/// were wedged rather than cleanly closed.
struct BlockedPinger(AtomicBool);

#[async_trait::async_trait]
impl Pinger for BlockedPinger {
    async fn ping(&self, _agent_id: AgentId, ack_timeout: Duration) -> Result<(), RuntimeError> {
        self.0.store(true, Ordering::SeqCst);
        Err(RuntimeError::Timeout(ack_timeout))
    }
}

#[tokio::test]
async fn three_unacked_health_checks_mark_the_agent_offline_and_pause_schedules() {
    let store = Arc::new(Store::<FakeClock, NullWal>::new(FakeClock::new(), NullWal, MaterializedState::default()));
    let adapter = Arc::new(FakeAdapter::new());
    let pinger = Arc::new(BlockedPinger(AtomicBool::new(false)));
    let org_id = OrgId::new();
    let agent_id = register_agent(&store, org_id, "agent-1");

    let runtime = dispatchd_engine::Runtime::new(
        store.clone(),
        adapter,
        pinger.clone(),
        Duration::from_secs(60),
        Duration::from_secs(30),
        Duration::from_secs(5),
        Duration::from_secs(300),
        Duration::from_secs(300),
    );
    runtime.start_agent(agent_id);
    assert_eq!(runtime.schedules().state_of(agent_id), ScheduleState::Running);

    for _ in 0..3 {
        dispatchd_engine::health_check::tick(&store, runtime.schedules(), pinger.as_ref(), agent_id, Duration::from_secs(5)).await.unwrap();
    }

    assert_eq!(store.get_agent(agent_id).unwrap().status, AgentStatus::Offline);
    assert_eq!(runtime.schedules().state_of(agent_id), ScheduleState::Paused);
    assert!(pinger.0.load(Ordering::SeqCst));
}
