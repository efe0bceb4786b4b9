//! Dispatch engine
//!
//! Turns an [`IncomingMessage`] into at most one command execution:
//! prefix → parse → lookup → owner gate → guards → cooldown → middleware
//! chain → cooldown stamp. Every error raised past the lookup is contained
//! here and turned into a reply; nothing propagates to the transport.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Mention prefixes, runtime-attached guards
//! - 1.1.0: Middleware chain with built-in permission check
//! - 1.0.0: Initial dispatcher with owner gate, cooldowns and error containment

use anyhow::Result;
use log::{debug, error, info, warn};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::commands::catalog::CommandCatalog;
use crate::commands::context::{CommandContext, IncomingMessage};
use crate::commands::handler::{Command, Guard};
use crate::commands::metadata::{resolve_metadata, CommandOptions};
use crate::commands::parser::{parse_message, MentionMatcher};
use crate::commands::registry::{CommandRegistry, LoadSummary, RegisteredCommand};
use crate::core::config::DispatchConfig;
use crate::features::cooldowns::CooldownTracker;
use crate::features::guards::{GuardEvaluator, GuardVerdict};
use crate::features::middleware::{run_chain, Middleware, PermissionCheck};
use crate::features::owners::OwnerSet;

/// Reply sent when a non-owner invokes an owner-only command
pub const OWNER_ONLY_NOTICE: &str = "This command can only be used by the bot owner.";

/// How a single dispatch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not a command, or no such command
    Unhandled,
    /// Rejected by the owner gate, a guard or a cooldown
    Blocked,
    /// The middleware chain completed
    Handled,
    /// The command or a middleware failed; the failure was contained
    Failed,
}

impl DispatchOutcome {
    pub fn is_handled(self) -> bool {
        self == DispatchOutcome::Handled
    }
}

/// Cooldown reply used when the command has no notifier of its own
pub fn cooldown_notice(command: &str, remaining: Duration) -> String {
    format!(
        "Please wait {:.1} more second(s) before reusing the `{}` command.",
        remaining.as_millis() as f64 / 1000.0,
        command
    )
}

/// Command dispatcher
///
/// Owns the registry, cooldowns, guards and owners for one bot. Share it
/// behind an `Arc`; every method takes `&self`.
pub struct DispatchEngine {
    config: DispatchConfig,
    catalog: CommandCatalog,
    mention: MentionMatcher,
    bot_id: OnceLock<String>,
    /// Permission check first, then the configured middlewares
    chain: Vec<Arc<dyn Middleware>>,
    registry: RwLock<Arc<CommandRegistry>>,
    guards: GuardEvaluator,
    cooldowns: CooldownTracker,
    owners: OwnerSet,
}

impl DispatchEngine {
    /// Build an engine; commands are not loaded until [`DispatchEngine::init`]
    pub fn new(config: DispatchConfig, catalog: CommandCatalog) -> Result<Self> {
        let mut chain: Vec<Arc<dyn Middleware>> = Vec::with_capacity(config.middlewares.len() + 1);
        chain.push(Arc::new(PermissionCheck));
        chain.extend(config.middlewares.iter().cloned());

        let bot_id = OnceLock::new();
        if let Some(id) = &config.bot_id {
            let _ = bot_id.set(id.clone());
        }

        Ok(Self {
            owners: OwnerSet::new(config.owners.iter().cloned()),
            mention: MentionMatcher::new()?,
            bot_id,
            chain,
            catalog,
            config,
            registry: RwLock::new(Arc::new(CommandRegistry::new())),
            guards: GuardEvaluator::new(),
            cooldowns: CooldownTracker::new(),
        })
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Load commands from the configured directory
    pub async fn init(&self) -> Result<LoadSummary> {
        self.load().await
    }

    /// Replace every command with a fresh scan and forget all cooldowns
    ///
    /// Commands registered with [`DispatchEngine::register_command`] are
    /// dropped as well. If the scan fails the registry is left empty.
    pub async fn reload(&self) -> Result<LoadSummary> {
        info!("🔄 Reloading commands from {}", self.config.commands_dir.display());
        let summary = self.load().await;
        self.cooldowns.clear();
        summary
    }

    /// Remove every command and cooldown
    pub async fn clear(&self) {
        *self.registry.write().await = Arc::new(CommandRegistry::new());
        self.cooldowns.clear();
    }

    async fn load(&self) -> Result<LoadSummary> {
        let mut fresh = CommandRegistry::new();
        let result = fresh
            .load_from_directory(&self.config.commands_dir, &self.config.extensions, &self.catalog)
            .await;
        *self.registry.write().await = Arc::new(fresh);
        result
    }

    /// Register a command that does not live in the commands directory
    ///
    /// `options` override the command's own descriptor. Returns `false` if
    /// the name is taken.
    pub async fn register_command(&self, command: Arc<dyn Command>, options: CommandOptions) -> bool {
        let merged = command.options().overridden_by(options);
        let metadata = resolve_metadata(command.type_name(), merged, None);
        let mut registry = self.registry.write().await;
        Arc::make_mut(&mut *registry).insert(RegisteredCommand::new(command, metadata))
    }

    /// Snapshot of the current registry
    pub async fn registry(&self) -> Arc<CommandRegistry> {
        Arc::clone(&*self.registry.read().await)
    }

    pub fn commands_dir(&self) -> &Path {
        &self.config.commands_dir
    }

    // ------------------------------------------------------------------
    // Owners, guards, cooldowns, identity
    // ------------------------------------------------------------------

    pub fn owners(&self) -> &OwnerSet {
        &self.owners
    }

    pub fn add_owner(&self, user_id: impl Into<String>) -> bool {
        self.owners.add(user_id)
    }

    pub fn remove_owner(&self, user_id: &str) -> bool {
        self.owners.remove(user_id)
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owners.contains(user_id)
    }

    /// Attach a guard to a command; it runs after the command's own guards
    pub fn add_guard(&self, command: &str, guard: Arc<dyn Guard>) {
        self.guards.attach(command, guard);
    }

    /// Drop every guard attached with [`DispatchEngine::add_guard`]
    ///
    /// Guards declared by the command itself or its manifest stay.
    pub fn remove_guards(&self, command: &str) {
        self.guards.detach_all(command);
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Record the bot's own user id, typically once the transport is ready
    pub fn set_bot_id(&self, bot_id: impl Into<String>) {
        let bot_id = bot_id.into();
        if let Err(rejected) = self.bot_id.set(bot_id) {
            if self.bot_id.get() != Some(&rejected) {
                warn!("Bot id already set, ignoring {rejected}");
            }
        }
    }

    pub fn bot_id(&self) -> Option<&str> {
        self.bot_id.get().map(String::as_str)
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Whether a message should be looked at at all
    pub fn should_process(&self, message: &IncomingMessage) -> bool {
        match &self.config.message_filter {
            Some(filter) => filter(message),
            None => default_filter(message),
        }
    }

    /// Prefix in effect for a server
    pub async fn resolve_prefix(&self, server_id: Option<&str>) -> Result<String> {
        self.config.prefix.resolve(server_id).await
    }

    /// Parse a message into a context, or `None` if it is not a command
    pub async fn parse_message(&self, message: &IncomingMessage) -> Option<CommandContext> {
        let prefix = match self.resolve_prefix(message.server_id.as_deref()).await {
            Ok(prefix) => prefix,
            Err(e) => {
                warn!("Prefix resolution failed for server {:?}: {:#}", message.server_id, e);
                return None;
            }
        };

        let mention = match (self.config.disable_mention_prefix, self.bot_id()) {
            (false, Some(bot_id)) => Some((&self.mention, bot_id)),
            _ => None,
        };

        let parsed = parse_message(&message.content, &prefix, mention)?;
        let registry = self.registry().await;
        let command_name = registry
            .get(&parsed.command_name)
            .map(|entry| entry.name().to_string())
            .unwrap_or(parsed.command_name);

        Some(CommandContext::new(
            parsed.prefix,
            message.content.clone(),
            command_name,
            parsed.args,
            message,
            registry,
        ))
    }

    /// Dispatch a message and report whether a command handled it
    pub async fn handle_message(&self, message: &IncomingMessage) -> bool {
        self.dispatch(message).await.is_handled()
    }

    /// Dispatch a message and report how it ended
    pub async fn dispatch(&self, message: &IncomingMessage) -> DispatchOutcome {
        if !self.should_process(message) {
            return DispatchOutcome::Unhandled;
        }
        match self.parse_message(message).await {
            Some(ctx) => self.execute(&ctx).await,
            None => DispatchOutcome::Unhandled,
        }
    }

    /// Run a parsed invocation through the gates and the middleware chain
    pub async fn execute(&self, ctx: &CommandContext) -> DispatchOutcome {
        let request_id = Uuid::new_v4();

        let Some(entry) = ctx.registry().get(&ctx.command_name) else {
            debug!("[{request_id}] No command named '{}'", ctx.command_name);
            return DispatchOutcome::Unhandled;
        };

        info!(
            "[{request_id}] 🎯 '{}' invoked by {} in {} ({} args)",
            entry.name(),
            ctx.author_id,
            ctx.channel_id,
            ctx.args.len()
        );

        match self.run_pipeline(&entry, ctx, request_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.contain_failure(&entry, ctx, e, request_id).await;
                DispatchOutcome::Failed
            }
        }
    }

    async fn run_pipeline(
        &self,
        entry: &RegisteredCommand,
        ctx: &CommandContext,
        request_id: Uuid,
    ) -> Result<DispatchOutcome> {
        let metadata = entry.metadata();

        if metadata.owner_only && !self.owners.contains(&ctx.author_id) {
            debug!("[{request_id}] 🚫 '{}' is owner-only, {} is not an owner", entry.name(), ctx.author_id);
            self.notify(ctx, OWNER_ONLY_NOTICE, request_id).await;
            return Ok(DispatchOutcome::Blocked);
        }

        if let GuardVerdict::Reject(guard) = self.guards.evaluate(entry, ctx).await {
            debug!("[{request_id}] 🚫 Guard '{guard}' blocked '{}'", entry.name());
            return Ok(DispatchOutcome::Blocked);
        }

        if !self.cooldowns.check(&ctx.author_id, metadata) {
            let remaining = self.cooldowns.remaining(&ctx.author_id, metadata);
            debug!("[{request_id}] ⏳ {} is cooling down on '{}' ({remaining:?} left)", ctx.author_id, entry.name());
            if !entry.command().on_cooldown(ctx, remaining).await? {
                self.notify(ctx, &cooldown_notice(entry.name(), remaining), request_id)
                    .await;
            }
            return Ok(DispatchOutcome::Blocked);
        }

        run_chain(entry, &self.chain, ctx).await?;

        if metadata.has_cooldown() {
            self.cooldowns.set(&ctx.author_id, metadata);
        }
        debug!("[{request_id}] ✅ '{}' completed", entry.name());
        Ok(DispatchOutcome::Handled)
    }

    async fn contain_failure(
        &self,
        entry: &RegisteredCommand,
        ctx: &CommandContext,
        error: anyhow::Error,
        request_id: Uuid,
    ) {
        match entry.command().on_error(ctx, &error).await {
            Ok(true) => {
                debug!("[{request_id}] '{}' handled its own error: {:#}", entry.name(), error);
                return;
            }
            Ok(false) => error!("[{request_id}] ❌ '{}' failed: {:#}", entry.name(), error),
            Err(handler_error) => error!(
                "[{request_id}] ❌ '{}' failed: {:#} (error handler also failed: {:#})",
                entry.name(),
                error,
                handler_error
            ),
        }

        self.notify(ctx, &format!("An error occurred: {error}"), request_id)
            .await;
    }

    /// Reply, logging instead of failing if the transport refuses
    async fn notify(&self, ctx: &CommandContext, text: &str, request_id: Uuid) {
        if let Err(e) = ctx.reply(text).await {
            warn!("[{request_id}] Failed to send reply: {:#}", e);
        }
    }
}

/// Skip messages without an author or channel, and messages from bots
fn default_filter(message: &IncomingMessage) -> bool {
    !message.author_id.is_empty() && !message.channel_id.is_empty() && !message.author_is_bot
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .field("bot_id", &self.bot_id.get())
            .field("owners", &self.owners)
            .finish_non_exhaustive()
    }
}
