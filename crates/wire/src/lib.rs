// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dispatchd-wire: the gRPC transport boundary (§4.12, §6). `proto` holds the
//! generated prost/tonic types; `frame` holds the domain-facing `Frame` and
//! `OutboundFrame` enums and their conversions to/from the generated oneofs.

pub mod frame;

pub mod proto {
    tonic::include_proto!("dispatchd.wire");
}

pub use frame::{Frame, FrameError, OutboundFrame};