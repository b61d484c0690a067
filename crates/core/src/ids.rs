// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed identifiers for every addressable entity in the system.

crate::define_id! {
    /// A tenant boundary. Every other entity is scoped by `org_id`.
    pub struct OrgId("org-");
}

crate::define_id! {
    /// A remote process that executes code-generation jobs.
    pub struct AgentId("agt-");
}

crate::define_id! {
    /// A versioned job record, stable across all of its versions.
    pub struct JobId("job-");
}

crate::define_id! {
    /// An append-only audit record tied to a job.
    pub struct ActivityId("act-");
}

crate::define_id! {
    /// An SCM repository a job targets.
    pub struct RepoId("rep-");
}
