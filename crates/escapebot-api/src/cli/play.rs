//! `escapebot play`: a local session in the terminal.
//!
//! Each stdin line is one turn through the same orchestrator the webhook
//! uses. Replies are printed instead of sent.

use chrono_tz::Tz;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use escapebot_core::llm::LlmProvider;
use escapebot_core::repository::SessionStore;
use escapebot_core::transport::ReplyTransport;
use escapebot_core::turn::{InboundMessage, TurnOrchestrator, TurnOutcome};
use escapebot_infra::config::{local_now, secret_key_from_env};
use escapebot_types::error::TransportError;

use crate::state::Runtime;

const QUIT: &str = "/quit";

/// Prints reply segments to stdout.
pub struct ConsoleTransport;

impl ReplyTransport for ConsoleTransport {
    async fn send_reply(&self, _reply_token: &str, segments: &[String]) -> Result<(), TransportError> {
        for segment in segments {
            println!("  {} {}", console::style("▸").magenta().bold(), segment);
        }
        println!();
        Ok(())
    }
}

pub async fn play(runtime: &Runtime, user: &str) -> anyhow::Result<()> {
    let secret_key = secret_key_from_env()?;
    let orchestrator = runtime.orchestrator(secret_key, ConsoleTransport);

    println!();
    println!(
        "  {} Playing as {} (type {} or Ctrl+D to leave)",
        console::style("🗝").bold(),
        console::style(user).cyan(),
        console::style(QUIT).dim()
    );
    println!();

    let turns = play_lines(
        &orchestrator,
        user,
        runtime.timezone,
        BufReader::new(tokio::io::stdin()),
    )
    .await?;

    tracing::debug!(turns, "console session closed");
    Ok(())
}

/// Run one turn per non-blank line until EOF or `/quit`. Returns the number
/// of turns played.
pub async fn play_lines<S, L, T, R>(
    orchestrator: &TurnOrchestrator<S, L, T>,
    user: &str,
    timezone: Tz,
    reader: R,
) -> std::io::Result<usize>
where
    S: SessionStore,
    L: LlmProvider,
    T: ReplyTransport,
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut turns = 0;

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == QUIT {
            break;
        }

        turns += 1;
        let inbound = InboundMessage {
            user_id: user.to_string(),
            reply_token: format!("console-{turns}"),
            text: text.to_string(),
            received_at: local_now(timezone),
        };

        if let TurnOutcome::Aborted = orchestrator.handle_turn(&inbound).await {
            println!("  {}", console::style("(no reply, see the logs)").dim());
            println!();
        }
    }

    Ok(turns)
}
