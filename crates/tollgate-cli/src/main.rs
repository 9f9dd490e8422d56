//! Tollgate CLI - responder and operator tools for prompt bridges.
//!
//! The asking side of a bridge lives inside an agent process. This binary
//! is the other side: it lists what is waiting, answers it, and can ask
//! questions of its own for scripting and testing.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
pub mod config_bridge;
mod theme;

use commands::{ask, check, config, pending, respond};
use tollgate_config::{Config, ResolvedConfig};

/// Tollgate - answer and inspect human-in-the-loop prompts
#[derive(Parser)]
#[command(name = "tollgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the layered configuration
    #[arg(long, global = true, env = "TOLLGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Bridge document path (overrides configuration)
    #[arg(long, global = true)]
    bridge: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List prompts waiting for an answer
    Pending {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Answer a pending prompt
    Respond {
        /// Prompt ID
        id: String,

        /// Answer text; parsed as JSON when it is valid JSON
        answer: Option<String>,

        /// Refuse to answer
        #[arg(long, conflicts_with = "cancel")]
        decline: bool,

        /// Dismiss the prompt
        #[arg(long)]
        cancel: bool,
    },

    /// Ask a question and wait for the answer
    Ask {
        /// Question text
        message: String,

        /// How long to wait, in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Show how the policy treats a tool
    Check {
        /// Tool name
        tool: String,
    },

    /// Print the resolved configuration
    Config {
        /// Print JSON instead of annotated TOML
        #[arg(long)]
        json: bool,
    },
}

fn load_config(explicit: Option<&PathBuf>) -> Result<ResolvedConfig> {
    if let Some(path) = explicit {
        let config = Config::load_file(path)?;
        return Ok(ResolvedConfig {
            config,
            field_sources: tollgate_config::merge::FieldSources::new(),
            loaded_files: vec![path.display().to_string()],
        });
    }
    let workspace_root = std::env::current_dir().ok();
    Ok(Config::load(workspace_root.as_deref())?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let resolved = load_config(cli.config.as_ref())?;

    let mut log_config = config_bridge::to_log_config(&resolved.config);
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = tollgate_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    tracing::debug!(files = ?resolved.loaded_files, "configuration loaded");

    let cfg = &resolved.config;
    match cli.command {
        Commands::Pending { json } => {
            let bridge = config_bridge::to_bridge(cfg, cli.bridge)?;
            pending::run_pending(&bridge, json)?;
        },
        Commands::Respond {
            id,
            answer,
            decline,
            cancel,
        } => {
            let bridge = config_bridge::to_bridge(cfg, cli.bridge)?;
            let action = respond::action_from_flags(decline, cancel);
            respond::run_respond(&bridge, &id, action, answer.as_deref())?;
        },
        Commands::Ask {
            message,
            timeout_ms,
        } => {
            let bridge = config_bridge::to_bridge(cfg, cli.bridge)?;
            let timeout = timeout_ms.map_or_else(
                || config_bridge::response_timeout(&cfg.bridge),
                std::time::Duration::from_millis,
            );
            let poll = config_bridge::poll_interval(&cfg.bridge);
            ask::run_ask(&bridge, &message, timeout, poll).await?;
        },
        Commands::Check { tool } => {
            let policy = config_bridge::to_policy(cfg)?;
            check::run_check(&policy, &tool);
        },
        Commands::Config { json } => {
            config::run_config(&resolved, json)?;
        },
    }

    Ok(())
}
