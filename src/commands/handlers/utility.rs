//! Utility commands
//!
//! Handles: ping, help, say
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Text-command versions driven by the registry snapshot
//! - 1.0.0: Extracted from the monolithic handler

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::discovery::CommandManifest;
use crate::commands::handler::Command;
use crate::commands::metadata::{CommandMetadata, CommandOptions};

/// `ping` - check that the bot is responsive
#[derive(Debug, Default, Clone, Copy)]
pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    fn options(&self) -> CommandOptions {
        CommandOptions::new()
            .description("Test bot responsiveness")
            .category("utility")
    }

    async fn run(&self, ctx: &CommandContext) -> Result<()> {
        ctx.reply("Pong!").await?;
        info!("Ping command completed for user {}", ctx.author_id);
        Ok(())
    }
}

/// `help [command]` - list commands or describe one
#[derive(Debug, Default, Clone, Copy)]
pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn options(&self) -> CommandOptions {
        CommandOptions::new()
            .description("Show available commands, or details for one command")
            .aliases(["commands"])
            .category("utility")
    }

    async fn run(&self, ctx: &CommandContext) -> Result<()> {
        let text = match ctx.args.first() {
            Some(name) => match ctx.registry().get(name) {
                Some(entry) => describe(&ctx.prefix, entry.metadata()),
                None => format!("No command named `{name}`."),
            },
            None => overview(ctx),
        };
        ctx.reply(&text).await
    }
}

fn overview(ctx: &CommandContext) -> String {
    let mut text = String::from("**Available Commands:**\n");
    for (category, entries) in ctx.registry().categories() {
        let _ = writeln!(text, "\n__{category}__");
        for entry in entries {
            let meta = entry.metadata();
            let _ = writeln!(text, "`{}{}` - {}", ctx.prefix, meta.name, meta.description);
        }
    }
    text
}

fn describe(prefix: &str, meta: &CommandMetadata) -> String {
    let mut text = format!("**{prefix}{}**\n{}\n", meta.name, meta.description);
    if !meta.aliases.is_empty() {
        let aliases: Vec<_> = meta.aliases.iter().map(|a| format!("`{a}`")).collect();
        let _ = writeln!(text, "Aliases: {}", aliases.join(", "));
    }
    let _ = writeln!(text, "Category: {}", meta.category);
    if meta.has_cooldown() {
        let _ = writeln!(text, "Cooldown: {:.1}s", meta.cooldown_ms as f64 / 1000.0);
    }
    if meta.owner_only {
        text.push_str("Owner only\n");
    }
    text
}

/// `say` - reply with fixed text configured in the command's manifest
///
/// ```yaml
/// command: SayCommand
/// name: rules
/// settings:
///   text: Be excellent to each other.
/// ```
#[derive(Debug, Clone)]
pub struct SayCommand {
    text: String,
}

impl SayCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Build from a manifest; `settings.text` is required
    pub fn from_manifest(manifest: &CommandManifest) -> Result<Arc<dyn Command>> {
        let text = manifest
            .setting_str("text")
            .ok_or_else(|| anyhow!("SayCommand requires settings.text"))?;
        Ok(Arc::new(Self::new(text)))
    }
}

#[async_trait]
impl Command for SayCommand {
    fn options(&self) -> CommandOptions {
        CommandOptions::new().description("Reply with a fixed message")
    }

    async fn run(&self, ctx: &CommandContext) -> Result<()> {
        ctx.reply(&self.text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::metadata::resolve_metadata;
    use crate::commands::registry::CommandRegistry;
    use crate::test_support::{context_for, RecordingReplier};

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        for command in [Arc::new(PingCommand) as Arc<dyn Command>, Arc::new(HelpCommand)] {
            let meta = resolve_metadata(command.type_name(), command.options(), None);
            registry.register(command, meta);
        }
        let roll = resolve_metadata(
            "RollCommand",
            CommandOptions::new()
                .description("Roll a die")
                .aliases(["dice"])
                .category("fun")
                .cooldown_ms(1500),
            None,
        );
        registry.register(Arc::new(SayCommand::new("4")), roll);
        registry
    }

    #[tokio::test]
    async fn test_ping_replies_pong() {
        let replier = RecordingReplier::new();
        let ctx = context_for("!ping", "ping", &[], replier.clone(), registry());

        PingCommand.run(&ctx).await.unwrap();
        assert_eq!(replier.replies(), vec!["Pong!"]);
    }

    #[tokio::test]
    async fn test_help_lists_categories() {
        let replier = RecordingReplier::new();
        let ctx = context_for("!help", "help", &[], replier.clone(), registry());

        HelpCommand.run(&ctx).await.unwrap();
        let text = &replier.replies()[0];
        assert!(text.contains("__fun__"));
        assert!(text.contains("__utility__"));
        assert!(text.contains("`!roll` - Roll a die"));
        assert!(text.find("__fun__") < text.find("__utility__"));
    }

    #[tokio::test]
    async fn test_help_describes_one_command_by_alias() {
        let replier = RecordingReplier::new();
        let ctx = context_for("!help dice", "help", &["dice"], replier.clone(), registry());

        HelpCommand.run(&ctx).await.unwrap();
        let text = &replier.replies()[0];
        assert!(text.starts_with("**!roll**"));
        assert!(text.contains("Aliases: `dice`"));
        assert!(text.contains("Cooldown: 1.5s"));
    }

    #[tokio::test]
    async fn test_help_unknown_command() {
        let replier = RecordingReplier::new();
        let ctx = context_for("!help nope", "help", &["nope"], replier.clone(), registry());

        HelpCommand.run(&ctx).await.unwrap();
        assert_eq!(replier.replies(), vec!["No command named `nope`."]);
    }

    #[test]
    fn test_say_requires_text() {
        let missing: CommandManifest = serde_yaml::from_str("command: SayCommand\n").unwrap();
        assert!(SayCommand::from_manifest(&missing).is_err());

        let present: CommandManifest =
            serde_yaml::from_str("command: SayCommand\nsettings:\n  text: hi\n").unwrap();
        assert!(SayCommand::from_manifest(&present).is_ok());
    }
}
