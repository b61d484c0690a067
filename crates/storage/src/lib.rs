// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dispatchd-storage: the write-ahead log and the materialized state
//! replayed from it — the Persistent Store (§4.1, §4.2, §7).

pub mod error;
pub mod state;
pub mod wal;

pub use error::{ErrorKind, StoreError};
pub use state::{MaterializedState, Store};
pub use wal::{FileWal, NullWal, Wal};

#[cfg(test)]
mod tests;
