// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dispatchd-engine: the orchestration layer (§4.4-§4.10) running on top of
//! the Persistent Store (`dispatchd-storage`) and the remote agent boundary
//! (`dispatchd-adapters`). There is no separate workflow-engine runtime here
//! (see `DESIGN.md`'s realization note) — each workflow in the spec is a
//! plain async function or a `tokio::spawn`'d interval loop, composed by
//! [`Runtime`].

pub mod dispatch;
pub mod error;
pub mod health_check;
pub mod job_execution;
pub mod preprocess;
pub mod reprioritize;
pub mod runtime;
pub mod schedule;

pub use dispatch::{DispatchOutcome, InFlightGuard};
pub use error::{ErrorKind, RuntimeError};
pub use health_check::{HealthCheckOutcome, Pinger};
pub use preprocess::PreprocessOutcome;
pub use reprioritize::JobPatch;
pub use runtime::Runtime;
pub use schedule::{ScheduleRegistry, ScheduleState};
