// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dispatchctl`: operator CLI over the dispatch daemon's REST façade
//! (§4.11). Talks HTTP/JSON, never touches the store or the WAL directly.

mod client;
mod color;
mod commands;
mod exit_error;
mod output;

use client::RestClient;
use clap::Parser;
use exit_error::ExitError;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "dispatchctl", version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")), about = "Operator CLI for the dispatch daemon", styles = color::styles())]
struct Cli {
    /// Base URL of the REST façade.
    #[arg(long, env = "DISPATCHD_SERVER", default_value = "http://127.0.0.1:7700")]
    server: String,

    /// Bearer token identifying the calling org.
    #[arg(long, env = "DISPATCHD_API_KEY")]
    api_key: String,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let client = RestClient::new(cli.server, cli.api_key);

    if let Err(err) = commands::dispatch(cli.command, &client, cli.output).await {
        match err.downcast::<ExitError>() {
            Ok(exit_err) => {
                eprintln!("error: {exit_err}");
                std::process::exit(exit_err.code);
            }
            Err(err) => {
                eprintln!("error: {err:#}");
                std::process::exit(1);
            }
        }
    }
}
