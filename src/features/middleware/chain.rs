//! Middleware chain
//!
//! The chain is an ordered slice walked by [`Next`]: each middleware gets the
//! context and a `Next` positioned after itself. Calling [`Next::run`]
//! continues; returning without calling it skips the rest of the chain and
//! the command.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0

use anyhow::Result;
use async_trait::async_trait;
use log::trace;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::metadata::CommandMetadata;
use crate::commands::registry::RegisteredCommand;

/// Interceptor around command execution
///
/// # Example
///
/// ```ignore
/// struct Timing;
///
/// #[async_trait]
/// impl Middleware for Timing {
///     async fn handle(&self, ctx: &CommandContext, next: Next<'_>) -> Result<()> {
///         let started = std::time::Instant::now();
///         let result = next.run(ctx).await;
///         info!("{} took {:?}", ctx.command_name, started.elapsed());
///         result
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, ctx: &CommandContext, next: Next<'_>) -> Result<()>;
}

/// Continuation handed to a middleware
pub struct Next<'a> {
    command: &'a RegisteredCommand,
    remaining: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub fn new(command: &'a RegisteredCommand, chain: &'a [Arc<dyn Middleware>]) -> Self {
        Self {
            command,
            remaining: chain,
        }
    }

    /// Metadata of the command at the end of the chain
    pub fn metadata(&self) -> &'a CommandMetadata {
        self.command.metadata()
    }

    /// Run the rest of the chain, ending in the command itself
    pub async fn run(self, ctx: &CommandContext) -> Result<()> {
        match self.remaining.split_first() {
            Some((middleware, rest)) => {
                middleware
                    .handle(ctx, Next::new(self.command, rest))
                    .await
            }
            None => self.command.command().run(ctx).await,
        }
    }
}

/// Run `command` through `chain`
pub async fn run_chain(
    command: &RegisteredCommand,
    chain: &[Arc<dyn Middleware>],
    ctx: &CommandContext,
) -> Result<()> {
    Next::new(command, chain).run(ctx).await
}

/// Built-in permission interceptor
///
/// Currently a pass-through: permission tags are carried in the metadata but
/// not enforced, since enforcement depends on the transport's permission
/// model.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissionCheck;

#[async_trait]
impl Middleware for PermissionCheck {
    async fn handle(&self, ctx: &CommandContext, next: Next<'_>) -> Result<()> {
        let permissions = &next.metadata().permissions;
        if !permissions.is_empty() {
            trace!("'{}' declares permissions {:?}", ctx.command_name, permissions);
        }
        next.run(ctx).await
    }
}
