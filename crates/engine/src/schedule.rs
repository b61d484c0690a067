// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule Registry (§4.10, C10) — an in-process stand-in for "the workflow
//! engine's schedule". Tracks, per agent, a `{dispatch, health_check}` pair
//! of interval tasks and their `ScheduleState`.

use dispatchd_core::AgentId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    Absent,
    Running,
    Paused,
}

struct AgentSchedule {
    dispatch_paused: Arc<AtomicBool>,
    health_check_paused: Arc<AtomicBool>,
    dispatch_handle: JoinHandle<()>,
    health_check_handle: JoinHandle<()>,
}

/// Holds the two per-agent interval tasks and their pause flags. The
/// interval loop itself keeps ticking while paused (cheap) but skips firing
/// its body — matching "pause" rather than "cancel" semantics from §4.7.
pub struct ScheduleRegistry {
    agents: Mutex<HashMap<AgentId, AgentSchedule>>,
}

impl Default for ScheduleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleRegistry {
    pub fn new() -> Self {
        Self { agents: Mutex::new(HashMap::new()) }
    }

    pub fn state_of(&self, agent_id: AgentId) -> ScheduleState {
        match self.agents.lock().get(&agent_id) {
            None => ScheduleState::Absent,
            Some(schedule) => {
                if schedule.dispatch_paused.load(Ordering::SeqCst) {
                    ScheduleState::Paused
                } else {
                    ScheduleState::Running
                }
            }
        }
    }

    /// Spawns both interval tasks if absent; resumes them (without
    /// re-spawning) if paused; a no-op if already running.
    pub fn create_or_resume<DF, DFut, HF, HFut>(
        &self,
        agent_id: AgentId,
        dispatch_interval: Duration,
        health_check_interval: Duration,
        mut dispatch_tick: DF,
        mut health_check_tick: HF,
    ) where
        DF: FnMut() -> DFut + Send + 'static,
        DFut: std::future::Future<Output = ()> + Send,
        HF: FnMut() -> HFut + Send + 'static,
        HFut: std::future::Future<Output = ()> + Send,
    {
        let mut agents = self.agents.lock();
        if let Some(existing) = agents.get(&agent_id) {
            existing.dispatch_paused.store(false, Ordering::SeqCst);
            existing.health_check_paused.store(false, Ordering::SeqCst);
            return;
        }

        let dispatch_paused = Arc::new(AtomicBool::new(false));
        let health_check_paused = Arc::new(AtomicBool::new(false));

        let dp = dispatch_paused.clone();
        let dispatch_handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(dispatch_interval);
            loop {
                ticker.tick().await;
                if !dp.load(Ordering::SeqCst) {
                    dispatch_tick().await;
                }
            }
        });

        let hp = health_check_paused.clone();
        let health_check_handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(health_check_interval);
            loop {
                ticker.tick().await;
                if !hp.load(Ordering::SeqCst) {
                    health_check_tick().await;
                }
            }
        });

        agents.insert(agent_id, AgentSchedule { dispatch_paused, health_check_paused, dispatch_handle, health_check_handle });
    }

    pub fn pause(&self, agent_id: AgentId) {
        if let Some(schedule) = self.agents.lock().get(&agent_id) {
            schedule.dispatch_paused.store(true, Ordering::SeqCst);
            schedule.health_check_paused.store(true, Ordering::SeqCst);
        }
    }

    pub fn remove(&self, agent_id: AgentId) {
        if let Some(schedule) = self.agents.lock().remove(&agent_id) {
            schedule.dispatch_handle.abort();
            schedule.health_check_handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn create_or_resume_is_idempotent_while_running() {
        let registry = ScheduleRegistry::new();
        let agent_id = AgentId::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c1 = calls.clone();
        let c2 = calls.clone();
        registry.create_or_resume(
            agent_id,
            Duration::from_millis(10),
            Duration::from_millis(10),
            move || {
                let c1 = c1.clone();
                async move {
                    c1.fetch_add(1, Ordering::SeqCst);
                }
            },
            move || {
                let c2 = c2.clone();
                async move {
                    c2.fetch_add(1, Ordering::SeqCst);
                }
            },
        );
        assert_eq!(registry.state_of(agent_id), ScheduleState::Running);

        // Idempotent: calling again while running doesn't spawn a second pair.
        registry.create_or_resume(agent_id, Duration::from_millis(10), Duration::from_millis(10), || async {}, || async {});
        assert_eq!(registry.state_of(agent_id), ScheduleState::Running);

        tokio::time::advance(Duration::from_millis(35)).await;
        tokio::task::yield_now().await;
        assert!(calls.load(Ordering::SeqCst) >= 2);

        registry.remove(agent_id);
        assert_eq!(registry.state_of(agent_id), ScheduleState::Absent);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_firing_without_cancelling_the_interval() {
        let registry = ScheduleRegistry::new();
        let agent_id = AgentId::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c1 = calls.clone();

        registry.create_or_resume(
            agent_id,
            Duration::from_millis(10),
            Duration::from_millis(1_000_000),
            move || {
                let c1 = c1.clone();
                async move {
                    c1.fetch_add(1, Ordering::SeqCst);
                }
            },
            || async {},
        );
        registry.pause(agent_id);
        assert_eq!(registry.state_of(agent_id), ScheduleState::Paused);

        tokio::time::advance(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        registry.create_or_resume(agent_id, Duration::from_millis(10), Duration::from_millis(1_000_000), || async {}, || async {});
        assert_eq!(registry.state_of(agent_id), ScheduleState::Running);
    }
}
