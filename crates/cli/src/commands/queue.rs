// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dispatchctl queue` - pause/resume/inspect a queue (`/queues/:queue_type`
//! routes, §6). `queue_type` is `backlog` or `rework`; anything else is
//! rejected server-side with a 400.

use crate::client::RestClient;
use crate::color;
use crate::output::{format_or_json, OutputFormat};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommand,
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// Pause a queue — dispatch skips it until resumed
    Pause {
        /// "backlog" or "rework"
        queue_type: String,
    },
    /// Resume a paused queue
    Resume {
        /// "backlog" or "rework"
        queue_type: String,
    },
    /// Show whether a queue is paused
    Status {
        /// "backlog" or "rework"
        queue_type: String,
    },
}

pub async fn run(args: QueueArgs, client: &RestClient, format: OutputFormat) -> anyhow::Result<()> {
    match args.command {
        QueueCommand::Pause { queue_type } => {
            client.pause_queue(&queue_type).await?;
            println!("{} queue paused", color::literal(&queue_type));
            Ok(())
        }
        QueueCommand::Resume { queue_type } => {
            client.resume_queue(&queue_type).await?;
            println!("{} queue resumed", color::literal(&queue_type));
            Ok(())
        }
        QueueCommand::Status { queue_type } => {
            let status = client.queue_status(&queue_type).await?;
            format_or_json(format, &status, || {
                println!("{}: {}", color::header(&queue_type), if status.is_paused { "paused" } else { "running" });
            })
        }
    }
}
