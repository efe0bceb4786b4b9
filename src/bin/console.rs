//! Drive the dispatcher from standard input
//!
//! Every line is treated as a message from `CONSOLE_USER_ID`. Two local
//! directives are handled before dispatch: `:reload` rescans the commands
//! directory and `:quit` exits.

use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;
use tokio::io::{stdin, stdout, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use switchboard::commands::{CommandCatalog, IncomingMessage, Replier};
use switchboard::core::Settings;
use switchboard::DispatchEngine;

const CHANNEL: &str = "console";

/// Writes replies to stdout
struct ConsoleReplier {
    out: Mutex<tokio::io::Stdout>,
}

#[async_trait::async_trait]
impl Replier for ConsoleReplier {
    async fn reply(&self, text: &str) -> Result<()> {
        let mut out = self.out.lock().await;
        out.write_all(format!("{text}\n").as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let settings = Settings::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&settings.log_level))
        .init();

    let engine = DispatchEngine::new(settings.dispatch_config(), CommandCatalog::with_builtins())?;
    let summary = engine.init().await?;
    info!(
        "📦 {} commands loaded ({} skipped, {} conflicts)",
        summary.loaded, summary.skipped, summary.conflicts
    );

    let replier = Arc::new(ConsoleReplier {
        out: Mutex::new(stdout()),
    });
    let mut lines = BufReader::new(stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            ":quit" => break,
            ":reload" => {
                let notice = match engine.reload().await {
                    Ok(summary) => format!("Reloaded {} commands", summary.loaded),
                    Err(e) => {
                        error!("❌ Reload failed: {e:#}");
                        format!("Reload failed: {e}")
                    }
                };
                replier.reply(&notice).await?;
                continue;
            }
            _ => {}
        }

        let message = IncomingMessage::new(line, settings.console_user_id.clone(), CHANNEL, replier.clone());
        if !engine.handle_message(&message).await {
            info!("Not handled: {}", message.content);
        }
    }

    Ok(())
}
