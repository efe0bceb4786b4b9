//! Built-in guards

use anyhow::Result;
use async_trait::async_trait;

use crate::commands::context::CommandContext;
use crate::commands::handler::Guard;

/// Only lets invocations from inside a server through
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerOnlyGuard;

#[async_trait]
impl Guard for ServerOnlyGuard {
    fn name(&self) -> &str {
        "ServerOnlyGuard"
    }

    async fn run(&self, ctx: &CommandContext) -> Result<bool> {
        Ok(ctx.is_in_server())
    }

    async fn guard_fail(&self, ctx: &CommandContext) -> Result<bool> {
        ctx.reply("This command can only be used inside a server.").await?;
        Ok(true)
    }
}
