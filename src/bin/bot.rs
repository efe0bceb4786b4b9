use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::ChannelId;
use serenity::prelude::*;
use std::sync::Arc;

use switchboard::commands::{CommandCatalog, IncomingMessage, Replier};
use switchboard::core::{split_reply, Settings, MESSAGE_LIMIT};
use switchboard::DispatchEngine;

/// Sends replies to the channel a command came from
struct DiscordReplier {
    http: Arc<Http>,
    channel_id: ChannelId,
}

#[async_trait]
impl Replier for DiscordReplier {
    async fn reply(&self, text: &str) -> Result<()> {
        for chunk in split_reply(text, MESSAGE_LIMIT) {
            self.channel_id.say(&*self.http, chunk).await?;
        }
        Ok(())
    }
}

struct Handler {
    engine: Arc<DispatchEngine>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        let replier = Arc::new(DiscordReplier {
            http: ctx.http.clone(),
            channel_id: msg.channel_id,
        });

        let mut incoming = IncomingMessage::new(
            msg.content.clone(),
            msg.author.id.0.to_string(),
            msg.channel_id.0.to_string(),
            replier,
        );
        if let Some(guild_id) = msg.guild_id {
            incoming = incoming.in_server(guild_id.0.to_string());
        }
        if msg.author.bot {
            incoming = incoming.from_bot();
        }

        self.engine.handle_message(&incoming).await;
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        self.engine.set_bot_id(ready.user.id.0.to_string());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let settings = Settings::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&settings.log_level))
        .init();

    info!("Starting Switchboard Discord bot...");

    let token = settings.require_discord_token()?.to_string();
    let engine = Arc::new(DispatchEngine::new(
        settings.dispatch_config(),
        CommandCatalog::with_builtins(),
    )?);

    let summary = engine.init().await?;
    info!(
        "📦 {} commands loaded ({} skipped, {} conflicts)",
        summary.loaded, summary.skipped, summary.conflicts
    );
    if summary.loaded == 0 {
        warn!("No commands loaded from {}", engine.commands_dir().display());
    }

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&token, intents)
        .event_handler(Handler { engine })
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Establishing WebSocket connection to Discord gateway...");
    if let Err(why) = client.start().await {
        error!("Client error: {why:?}");
        return Err(anyhow::anyhow!("Discord client error: {}", why));
    }

    Ok(())
}
