// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dispatchctl job` - job management commands (`/jobs` routes, §6).

use crate::client::{CreateJobRequest, JobPatch, RestClient};
use crate::color;
use crate::output::{format_or_json, format_time_ago, handle_list, OutputFormat};
use clap::{Args, Subcommand};
use serde_json::Value;
use std::io::Write;

#[derive(Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// List jobs in the caller's org
    List,
    /// Show one job
    Show {
        /// Job ID
        id: String,
        /// Show a specific version instead of the latest
        #[arg(long)]
        version: Option<u32>,
    },
    /// Enqueue a new job
    Create {
        /// Prompt that seeds the job
        prompt: String,
        /// Source label recorded on the job (default: "cli")
        #[arg(long)]
        source: Option<String>,
        /// Repo ID to associate with the job
        #[arg(long)]
        repo_id: Option<String>,
    },
    /// Dispatch a queued job to a specific agent immediately
    Execute {
        /// Job ID
        id: String,
        /// Agent ID to dispatch to
        agent_id: String,
    },
    /// Move a job to a new position in its queue
    Reprioritize {
        /// Job ID
        id: String,
        /// Zero-based position in the queue
        position: i64,
    },
    /// Archive a terminal job
    Archive {
        /// Job ID
        id: String,
    },
    /// Record the user's review decision on a job
    Review {
        /// Job ID
        id: String,
        /// Acceptance decision
        #[arg(value_enum)]
        decision: ReviewDecision,
        /// Comment explaining a rework request
        #[arg(long)]
        comment: Option<String>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum ReviewDecision {
    Accept,
    Rework,
    Reject,
}

impl ReviewDecision {
    fn as_status(self) -> &'static str {
        match self {
            ReviewDecision::Accept => "reviewed_and_accepted",
            ReviewDecision::Rework => "reviewed_and_asked_rework",
            ReviewDecision::Reject => "rejected",
        }
    }
}

pub async fn run(args: JobArgs, client: &RestClient, format: OutputFormat) -> anyhow::Result<()> {
    match args.command {
        JobCommand::List => list(client, format).await,
        JobCommand::Show { id, version } => show(client, format, &id, version).await,
        JobCommand::Create { prompt, source, repo_id } => create(client, format, prompt, source, repo_id).await,
        JobCommand::Execute { id, agent_id } => execute(client, format, &id, &agent_id).await,
        JobCommand::Reprioritize { id, position } => reprioritize(client, format, &id, position).await,
        JobCommand::Archive { id } => archive(client, format, &id).await,
        JobCommand::Review { id, decision, comment } => review(client, format, &id, decision, comment).await,
    }
}

async fn list(client: &RestClient, format: OutputFormat) -> anyhow::Result<()> {
    let jobs = client.list_jobs().await?;
    let jobs = jobs.as_array().cloned().unwrap_or_default();
    handle_list(format, &jobs, "No jobs found", |jobs, out| {
        let _ = writeln!(out, "{:<23}  {:<12}  {:<10}  {:<7}  {}", color::header("ID"), color::header("STATUS"), color::header("QUEUE"), color::header("POS"), color::header("CREATED"));
        for job in jobs {
            let _ = writeln!(
                out,
                "{:<23}  {:<12}  {:<10}  {:<7}  {}",
                color::literal(job["id"].as_str().unwrap_or("-")),
                job["status"].as_str().unwrap_or("-"),
                job["queue_type"].as_str().unwrap_or("-"),
                job["order_in_queue"].as_i64().unwrap_or(-1),
                color::muted(&format_time_ago(job["created_at_ms"].as_u64().unwrap_or(0))),
            );
        }
    })
}

async fn show(client: &RestClient, format: OutputFormat, id: &str, version: Option<u32>) -> anyhow::Result<()> {
    let job = client.get_job(id, version).await?;
    print_job_detail(format, &job)
}

async fn create(client: &RestClient, format: OutputFormat, prompt: String, source: Option<String>, repo_id: Option<String>) -> anyhow::Result<()> {
    let job = client.create_job(CreateJobRequest { prompt, source, repo_id }).await?;
    print_job_detail(format, &job)
}

async fn execute(client: &RestClient, format: OutputFormat, id: &str, agent_id: &str) -> anyhow::Result<()> {
    let job = client.execute_job(id, agent_id).await?;
    print_job_detail(format, &job)
}

async fn reprioritize(client: &RestClient, format: OutputFormat, id: &str, position: i64) -> anyhow::Result<()> {
    let job = client.reprioritize_job(id, position).await?;
    print_job_detail(format, &job)
}

async fn archive(client: &RestClient, format: OutputFormat, id: &str) -> anyhow::Result<()> {
    let job = client.archive_job(id).await?;
    print_job_detail(format, &job)
}

async fn review(client: &RestClient, format: OutputFormat, id: &str, decision: ReviewDecision, comment: Option<String>) -> anyhow::Result<()> {
    let patch = JobPatch { user_acceptance_status: Some(decision.as_status().to_string()), user_comment: comment, ..Default::default() };
    let job = client.update_job(id, patch).await?;
    print_job_detail(format, &job)
}

fn print_job_detail(format: OutputFormat, job: &Value) -> anyhow::Result<()> {
    format_or_json(format, job, || {
        println!("{}: {}", color::header("id"), job["id"].as_str().unwrap_or("-"));
        println!("{}: {}", color::header("status"), job["status"].as_str().unwrap_or("-"));
        println!("{}: {}", color::header("priority"), job["priority"].as_str().unwrap_or("-"));
        println!("{}: {}", color::header("queue"), job["queue_type"].as_str().unwrap_or("none"));
        println!("{}: {}", color::header("agent"), job["agent_id"].as_str().unwrap_or("-"));
        println!("{}: {}", color::header("prompt"), job["user_input"]["prompt"].as_str().unwrap_or("-"));
    })
}
