//! CLI command definitions for the `escapebot` binary.

pub mod play;
pub mod prompt;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use escapebot_types::phase::Phase;

/// Escape-room chat game server.
#[derive(Parser)]
#[command(name = "escapebot", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// More log output (-v for debug, -vv for trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the webhook server.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "0.0.0.0", env = "ESCAPEBOT_HOST")]
        host: String,

        /// Port to listen on.
        #[arg(long, default_value_t = 8080, env = "PORT")]
        port: u16,
    },

    /// Play the game in this terminal.
    Play {
        /// Player id the session is stored under.
        #[arg(long, default_value = "console")]
        user: String,
    },

    /// Manage the phase prompt templates.
    Prompt {
        #[command(subcommand)]
        command: PromptCommand,
    },
}

#[derive(Subcommand)]
pub enum PromptCommand {
    /// Store the prompt for a phase from a file.
    Set {
        /// intro, investigation, reasoning, outro or end.
        phase: Phase,
        file: PathBuf,
    },

    /// Print the stored prompt for a phase.
    Show { phase: Phase },
}
