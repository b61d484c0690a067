// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dispatchctl agent` - agent registry commands (`/agents` routes, §6).
//!
//! Agents register themselves via the backend gRPC surface
//! ([`dispatchd_daemon::grpc`]); this surface only reads, removes, and
//! reconnects the rows they create.

use crate::client::RestClient;
use crate::color;
use crate::output::{format_or_json, format_time_ago, handle_list, OutputFormat};
use clap::{Args, Subcommand};
use serde_json::Value;
use std::io::Write;

#[derive(Args)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommand,
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List agents registered to the caller's org
    List,
    /// Show one agent
    Show {
        /// Agent ID
        id: String,
    },
    /// Deregister an agent
    Remove {
        /// Agent ID
        id: String,
    },
    /// Ping an agent synchronously to confirm it's reachable
    Reconnect {
        /// Agent ID
        id: String,
        /// How long to wait for the ping to ack, in seconds
        #[arg(long)]
        ping_timeout_secs: Option<u64>,
    },
}

pub async fn run(args: AgentArgs, client: &RestClient, format: OutputFormat) -> anyhow::Result<()> {
    match args.command {
        AgentCommand::List => list(client, format).await,
        AgentCommand::Show { id } => show(client, format, &id).await,
        AgentCommand::Remove { id } => remove(client, &id).await,
        AgentCommand::Reconnect { id, ping_timeout_secs } => reconnect(client, format, &id, ping_timeout_secs).await,
    }
}

async fn list(client: &RestClient, format: OutputFormat) -> anyhow::Result<()> {
    let agents = client.list_agents().await?;
    let agents = agents.as_array().cloned().unwrap_or_default();
    handle_list(format, &agents, "No agents found", |agents, out| {
        let _ = writeln!(out, "{:<23}  {:<8}  {:<21}  {:<10}  {}", color::header("ID"), color::header("STATUS"), color::header("HOST"), color::header("FAILURES"), color::header("LAST ACTIVE"));
        for agent in agents {
            let _ = writeln!(
                out,
                "{:<23}  {:<8}  {:<21}  {:<10}  {}",
                color::literal(agent["id"].as_str().unwrap_or("-")),
                agent["status"].as_str().unwrap_or("-"),
                format!("{}:{}", agent["host"].as_str().unwrap_or("-"), agent["port"].as_u64().unwrap_or(0)),
                agent["consecutive_failures"].as_u64().unwrap_or(0),
                color::muted(&format_time_ago(agent["last_active_ms"].as_u64().unwrap_or(0))),
            );
        }
    })
}

async fn show(client: &RestClient, format: OutputFormat, id: &str) -> anyhow::Result<()> {
    let agent = client.get_agent(id).await?;
    print_agent_detail(format, &agent)
}

async fn remove(client: &RestClient, id: &str) -> anyhow::Result<()> {
    client.remove_agent(id).await?;
    println!("Agent {id} removed");
    Ok(())
}

async fn reconnect(client: &RestClient, format: OutputFormat, id: &str, ping_timeout_secs: Option<u64>) -> anyhow::Result<()> {
    let agent = client.reconnect_agent(id, ping_timeout_secs).await?;
    print_agent_detail(format, &agent)
}

fn print_agent_detail(format: OutputFormat, agent: &Value) -> anyhow::Result<()> {
    format_or_json(format, agent, || {
        println!("{}: {}", color::header("id"), agent["id"].as_str().unwrap_or("-"));
        println!("{}: {}", color::header("status"), agent["status"].as_str().unwrap_or("-"));
        println!("{}: {}:{}", color::header("endpoint"), agent["host"].as_str().unwrap_or("-"), agent["port"].as_u64().unwrap_or(0));
        println!("{}: {}", color::header("consecutive_failures"), agent["consecutive_failures"].as_u64().unwrap_or(0));
    })
}
