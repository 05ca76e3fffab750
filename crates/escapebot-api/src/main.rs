//! escapebot CLI and webhook server entry point.
//!
//! Binary name: `escapebot`
//!
//! Parses CLI arguments, initializes tracing, the database and the game
//! script, then dispatches to the command handler.

mod cli;
mod http;
mod state;

#[cfg(test)]
mod testing;

use clap::Parser;

use escapebot_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands, PromptCommand};
use state::Runtime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        verbosity: cli.verbose,
        json: cli.json_logs,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let runtime = Runtime::init().await?;

    match cli.command {
        Commands::Serve { host, port } => cli::serve::serve(&runtime, &host, port).await,
        Commands::Play { user } => cli::play::play(&runtime, &user).await,
        Commands::Prompt { command } => match command {
            PromptCommand::Set { phase, file } => {
                cli::prompt::set_prompt(&runtime.store, phase, &file).await
            }
            PromptCommand::Show { phase } => cli::prompt::show_prompt(&runtime.store, phase).await,
        },
    }
}
