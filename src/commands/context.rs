//! Per-invocation command context and the message ingestion boundary
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Context is built per message from the parsed invocation
//! - 1.0.0: Initial implementation with shared service state

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use super::registry::CommandRegistry;

/// Capability to answer the message that triggered a command
///
/// Transport adapters implement this once per platform; the Discord adapter
/// sends to the originating channel, the console adapter prints to stdout.
#[async_trait]
pub trait Replier: Send + Sync {
    async fn reply(&self, text: &str) -> Result<()>;
}

/// An inbound message, already adapted from the transport's own type
#[derive(Clone)]
pub struct IncomingMessage {
    pub content: String,
    pub author_id: String,
    pub channel_id: String,
    /// Absent for direct messages
    pub server_id: Option<String>,
    /// Set when the author is an automated account
    pub author_is_bot: bool,
    pub replier: Arc<dyn Replier>,
}

impl IncomingMessage {
    pub fn new(
        content: impl Into<String>,
        author_id: impl Into<String>,
        channel_id: impl Into<String>,
        replier: Arc<dyn Replier>,
    ) -> Self {
        Self {
            content: content.into(),
            author_id: author_id.into(),
            channel_id: channel_id.into(),
            server_id: None,
            author_is_bot: false,
            replier,
        }
    }

    pub fn in_server(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = Some(server_id.into());
        self
    }

    pub fn from_bot(mut self) -> Self {
        self.author_is_bot = true;
        self
    }
}

impl fmt::Debug for IncomingMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingMessage")
            .field("content", &self.content)
            .field("author_id", &self.author_id)
            .field("channel_id", &self.channel_id)
            .field("server_id", &self.server_id)
            .field("author_is_bot", &self.author_is_bot)
            .finish_non_exhaustive()
    }
}

/// Everything a command needs for one invocation
///
/// Created by the dispatcher for a single message and dropped when that
/// dispatch finishes. Never shared between invocations.
pub struct CommandContext {
    /// The prefix that was consumed (literal prefix or the mention token)
    pub prefix: String,
    /// Raw message content as received
    pub content: String,
    /// Canonical command name after alias resolution
    pub command_name: String,
    pub args: Vec<String>,
    pub author_id: String,
    pub channel_id: String,
    pub server_id: Option<String>,
    replier: Arc<dyn Replier>,
    registry: Arc<CommandRegistry>,
}

impl CommandContext {
    pub(crate) fn new(
        prefix: String,
        content: String,
        command_name: String,
        args: Vec<String>,
        message: &IncomingMessage,
        registry: Arc<CommandRegistry>,
    ) -> Self {
        Self {
            prefix,
            content,
            command_name,
            args,
            author_id: message.author_id.clone(),
            channel_id: message.channel_id.clone(),
            server_id: message.server_id.clone(),
            replier: Arc::clone(&message.replier),
            registry,
        }
    }

    /// Reply to the message that triggered this invocation
    pub async fn reply(&self, text: &str) -> Result<()> {
        self.replier.reply(text).await
    }

    /// Snapshot of the registry this invocation was resolved against
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Arguments joined back into a single string
    pub fn rest(&self) -> String {
        self.args.join(" ")
    }

    pub fn is_in_server(&self) -> bool {
        self.server_id.is_some()
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("prefix", &self.prefix)
            .field("command_name", &self.command_name)
            .field("args", &self.args)
            .field("author_id", &self.author_id)
            .field("channel_id", &self.channel_id)
            .field("server_id", &self.server_id)
            .finish_non_exhaustive()
    }
}
