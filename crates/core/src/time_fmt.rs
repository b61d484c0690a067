// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Epoch-millisecond <-> human-readable timestamp formatting, shared by the
//! audit trail (`Job::updates`) and the Activity log.

use chrono::{DateTime, Utc};

pub fn epoch_ms_to_rfc3339(ms: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms as i64)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap_or_default())
        .to_rfc3339()
}
