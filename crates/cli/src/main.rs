// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sp` — CLI client for the sprite-sync daemon.
//!
//! Transient by design: every subcommand opens a connection, makes its
//! request(s), prints, and exits. The daemon owns all state.

mod client;
mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sp", about = "Two-way file sync with sprite sandboxes", version)]
struct Cli {
    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sprites
    #[command(alias = "ls")]
    List {
        /// Only sprites carrying any of these tags
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Only sprites whose local path starts with this prefix
        #[arg(long)]
        path: Option<String>,
        /// Only sprites whose name contains this substring
        #[arg(long)]
        name: Option<String>,
    },
    /// Show one sprite
    Get { name: String },
    /// Start (or re-establish) sync for a sprite
    Sync {
        name: String,
        /// Local directory; defaults to the current directory
        #[arg(long)]
        local: Option<PathBuf>,
        /// Remote directory; defaults to /home/sprite/NAME
        #[arg(long)]
        remote: Option<String>,
        /// Owning organization
        #[arg(long)]
        org: Option<String>,
    },
    /// Stop sync for a sprite
    Stop { name: String },
    /// Tear down and re-establish sync with stored paths
    Resync { name: String },
    /// Run the SSH-server bootstrap on a sprite
    Setup { name: String },
    /// Add a tag
    Tag { name: String, tag: String },
    /// Remove a tag
    Untag { name: String, tag: String },
    /// List a sprite's tags
    Tags { name: String },
    /// Pull provider records into the local database
    Import {
        /// Only these names; empty imports everything
        names: Vec<String>,
    },
    /// Delete a sprite record
    Delete {
        name: String,
        /// Also destroy the remote sprite
        #[arg(long)]
        destroy: bool,
    },
    /// Stream state deltas to stdout
    Watch,
    /// Check the daemon is answering
    Ping,
    /// Daemon management
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
}

#[derive(Subcommand)]
enum DaemonCommand {
    /// Start the daemon (background unless --foreground)
    Start {
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop,
    /// Check daemon status
    Status,
    /// Graceful in-place restart (picks up a new binary)
    Restart,
    /// Show recent daemon log lines
    Logs {
        #[arg(short = 'n', long, default_value = "200")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("sp: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::List { tags, path, name } => commands::list(tags, path, name, json).await,
        Commands::Get { name } => commands::get(&name, json).await,
        Commands::Sync { name, local, remote, org } => {
            commands::sync(&name, local, remote, org, json).await
        }
        Commands::Stop { name } => commands::stop(&name).await,
        Commands::Resync { name } => commands::resync(&name, json).await,
        Commands::Setup { name } => commands::setup(&name).await,
        Commands::Tag { name, tag } => commands::tag(&name, &tag).await,
        Commands::Untag { name, tag } => commands::untag(&name, &tag).await,
        Commands::Tags { name } => commands::tags(&name).await,
        Commands::Import { names } => commands::import(names, json).await,
        Commands::Delete { name, destroy } => commands::delete(&name, destroy).await,
        Commands::Watch => commands::watch().await,
        Commands::Ping => commands::ping().await,
        Commands::Daemon { command } => match command {
            DaemonCommand::Start { foreground } => commands::daemon_start(foreground).await,
            DaemonCommand::Stop => commands::daemon_stop().await,
            DaemonCommand::Status => commands::daemon_status().await,
            DaemonCommand::Restart => commands::daemon_restart().await,
            DaemonCommand::Logs { limit } => commands::daemon_logs(limit),
        },
    }
}
