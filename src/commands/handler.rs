//! Command and guard traits
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Text-command capability set (run, error/cooldown/guard hooks) and guards
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::context::CommandContext;
use super::metadata::CommandOptions;

/// Trait implemented by every command body
///
/// Only [`Command::run`] is required. The hook methods return `Ok(true)` when
/// they produced feedback for the user and `Ok(false)` when the command has
/// nothing to say, in which case the dispatcher falls back to its own reply.
///
/// # Example
///
/// ```ignore
/// #[derive(Default)]
/// pub struct PingCommand;
///
/// #[async_trait]
/// impl Command for PingCommand {
///     fn options(&self) -> CommandOptions {
///         CommandOptions::new().description("Check that the bot is alive")
///     }
///
///     async fn run(&self, ctx: &CommandContext) -> Result<()> {
///         ctx.reply("Pong!").await
///     }
/// }
/// ```
#[async_trait]
pub trait Command: Send + Sync {
    /// Short type identifier used to derive the default command name
    fn type_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Static descriptor for this command type
    fn options(&self) -> CommandOptions {
        CommandOptions::default()
    }

    /// Guards this command type always carries, evaluated in order
    fn guards(&self) -> Vec<Arc<dyn Guard>> {
        Vec::new()
    }

    /// Execute the command
    async fn run(&self, ctx: &CommandContext) -> Result<()>;

    /// Called when `run` or a middleware fails
    async fn on_error(&self, _ctx: &CommandContext, _error: &anyhow::Error) -> Result<bool> {
        Ok(false)
    }

    /// Called when the author is still cooling down
    async fn on_cooldown(&self, _ctx: &CommandContext, _remaining: Duration) -> Result<bool> {
        Ok(false)
    }

    /// Called when a guard rejects the invocation and the guard itself had no feedback
    async fn on_guard_fail(&self, _ctx: &CommandContext) -> Result<bool> {
        Ok(false)
    }
}

/// Pre-execution predicate that can veto a command
#[async_trait]
pub trait Guard: Send + Sync {
    /// Identifier used in diagnostics
    fn name(&self) -> &str;

    /// Return `Ok(true)` to let the invocation through
    async fn run(&self, ctx: &CommandContext) -> Result<bool>;

    /// Feedback for a rejected invocation
    async fn guard_fail(&self, _ctx: &CommandContext) -> Result<bool> {
        Ok(false)
    }
}

/// Last path segment of a fully qualified type name, generics stripped
pub fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ProbeCommand;

    #[async_trait]
    impl Command for ProbeCommand {
        async fn run(&self, _ctx: &CommandContext) -> Result<()> {
            Ok(())
        }
    }

    fn _assert_object_safe(_: &dyn Command, _: &dyn Guard) {}

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("crate::commands::PingCommand"), "PingCommand");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_default_type_name_and_options() {
        let command: Arc<dyn Command> = Arc::new(ProbeCommand);
        assert_eq!(command.type_name(), "ProbeCommand");
        assert_eq!(command.options(), CommandOptions::default());
        assert!(command.guards().is_empty());
    }
}
