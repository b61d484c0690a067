// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations, one module per REST resource.

pub mod agent;
pub mod job;
pub mod queue;

use crate::client::RestClient;
use crate::output::OutputFormat;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Command {
    /// Manage jobs
    Job(job::JobArgs),
    /// Manage registered agents
    Agent(agent::AgentArgs),
    /// Pause/resume/inspect an org's dispatch queues
    Queue(queue::QueueArgs),
}

pub async fn dispatch(command: Command, client: &RestClient, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        Command::Job(args) => job::run(args, client, format).await,
        Command::Agent(args) => agent::run(args, client, format).await,
        Command::Queue(args) => queue::run(args, client, format).await,
    }
}
