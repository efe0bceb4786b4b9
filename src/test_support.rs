//! Test doubles shared by the unit tests

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::commands::context::{CommandContext, IncomingMessage, Replier};
use crate::commands::handler::{Command, Guard};
use crate::commands::registry::CommandRegistry;

/// Replier that records every reply
#[derive(Default)]
pub struct RecordingReplier {
    replies: Mutex<Vec<String>>,
}

impl RecordingReplier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl Replier for RecordingReplier {
    async fn reply(&self, text: &str) -> Result<()> {
        self.replies.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Command whose behaviour is chosen by the test
#[derive(Default)]
pub struct ScriptedCommand {
    pub fail_with: Option<String>,
    pub handles_errors: bool,
    pub handles_cooldown: bool,
    pub runs: AtomicUsize,
    pub errors_seen: Mutex<Vec<String>>,
    pub cooldowns_seen: Mutex<Vec<Duration>>,
}

impl ScriptedCommand {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        })
    }

    pub fn failing_with_handler(message: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(message.to_string()),
            handles_errors: true,
            ..Self::default()
        })
    }

    pub fn with_cooldown_notifier() -> Arc<Self> {
        Arc::new(Self {
            handles_cooldown: true,
            ..Self::default()
        })
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Command for ScriptedCommand {
    async fn run(&self, ctx: &CommandContext) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => Err(anyhow!("{message}")),
            None => ctx.reply("ran").await,
        }
    }

    async fn on_error(&self, ctx: &CommandContext, error: &anyhow::Error) -> Result<bool> {
        if !self.handles_errors {
            return Ok(false);
        }
        self.errors_seen.lock().unwrap().push(error.to_string());
        ctx.reply("handled by command").await?;
        Ok(true)
    }

    async fn on_cooldown(&self, ctx: &CommandContext, remaining: Duration) -> Result<bool> {
        if !self.handles_cooldown {
            return Ok(false);
        }
        self.cooldowns_seen.lock().unwrap().push(remaining);
        ctx.reply("custom cooldown").await?;
        Ok(true)
    }
}

/// Guard with a fixed verdict
pub struct ScriptedGuard {
    pub name: String,
    pub verdict: Result<bool, String>,
    pub feedback: Option<String>,
    pub calls: AtomicUsize,
}

impl ScriptedGuard {
    pub fn new(name: &str, verdict: Result<bool, String>, feedback: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            verdict,
            feedback: feedback.map(str::to_string),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn pass(name: &str) -> Arc<Self> {
        Self::new(name, Ok(true), None)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Guard for ScriptedGuard {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _ctx: &CommandContext) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict.clone().map_err(|e| anyhow!(e))
    }

    async fn guard_fail(&self, ctx: &CommandContext) -> Result<bool> {
        match &self.feedback {
            Some(text) => {
                ctx.reply(text).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Write a command unit below `root`, creating parent directories
pub fn write_unit(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

/// Build a context as the dispatcher would for prefix `!`
pub fn context_for(
    content: &str,
    command_name: &str,
    args: &[&str],
    replier: Arc<RecordingReplier>,
    registry: CommandRegistry,
) -> CommandContext {
    let message = IncomingMessage::new(content, "user-1", "channel-1", replier);
    CommandContext::new(
        "!".to_string(),
        content.to_string(),
        command_name.to_string(),
        args.iter().map(|a| a.to_string()).collect(),
        &message,
        Arc::new(registry),
    )
}
