// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only audit trail. One [`Activity`] row is written for every
//! create/update/archive/execute/reprioritize event described in §7.

use crate::ids::{ActivityId, JobId, OrgId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStatus {
    Read,
    Unread,
}

impl Default for ReadStatus {
    fn default() -> Self {
        ReadStatus::Unread
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub job_id: JobId,
    pub org_id: OrgId,
    pub name: String,
    pub summary: String,
    pub created_by: String,
    pub updated_by: String,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    pub code_generation_logs: Option<String>,
    pub verification_logs: Option<String>,
    /// Per-user read status; `None` means no user has looked at it yet.
    pub read_status: Option<ReadStatus>,
}

impl Activity {
    pub fn new(job_id: JobId, org_id: OrgId, name: impl Into<String>, summary: impl Into<String>, by: impl Into<String>, now_ms: u64) -> Self {
        let by = by.into();
        Self {
            id: ActivityId::new(),
            job_id,
            org_id,
            name: name.into(),
            summary: summary.into(),
            updated_by: by.clone(),
            created_by: by,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            code_generation_logs: None,
            verification_logs: None,
            read_status: Some(ReadStatus::Unread),
        }
    }
}
