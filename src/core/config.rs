//! Configuration
//!
//! [`DispatchConfig`] is what the dispatcher is constructed from.
//! [`Settings`] reads and validates the environment for the binaries and
//! turns it into a `DispatchConfig`.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Dispatch configuration (prefix, owners, middleware, discovery) and env settings
//! - 1.0.0: Initial creation with environment loading

use anyhow::{anyhow, Result};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::commands::context::IncomingMessage;
use crate::commands::discovery::default_extensions;
use crate::commands::parser::{Prefix, ServerPrefixes};
use crate::features::middleware::Middleware;

/// Predicate deciding whether a message is considered at all
pub type MessageFilter = Arc<dyn Fn(&IncomingMessage) -> bool + Send + Sync>;

/// Construction-time configuration for the dispatcher
#[derive(Clone)]
pub struct DispatchConfig {
    /// Root of the command unit tree
    pub commands_dir: PathBuf,
    pub prefix: Prefix,
    /// Initial owner ids
    pub owners: Vec<String>,
    /// Global middlewares, outermost first
    pub middlewares: Vec<Arc<dyn Middleware>>,
    /// File extensions scanned for command units
    pub extensions: Vec<String>,
    pub disable_mention_prefix: bool,
    /// The bot's own user id, when known up front
    pub bot_id: Option<String>,
    /// Replaces the default skip predicate
    pub message_filter: Option<MessageFilter>,
}

impl DispatchConfig {
    pub fn new(commands_dir: impl Into<PathBuf>) -> Self {
        Self {
            commands_dir: commands_dir.into(),
            prefix: Prefix::default(),
            owners: Vec::new(),
            middlewares: Vec::new(),
            extensions: default_extensions(),
            disable_mention_prefix: false,
            bot_id: None,
            message_filter: None,
        }
    }

    pub fn prefix(mut self, prefix: impl Into<Prefix>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn owners<I, S>(mut self, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.owners = owners.into_iter().map(Into::into).collect();
        self
    }

    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn disable_mention_prefix(mut self, disabled: bool) -> Self {
        self.disable_mention_prefix = disabled;
        self
    }

    pub fn bot_id(mut self, bot_id: impl Into<String>) -> Self {
        self.bot_id = Some(bot_id.into());
        self
    }

    pub fn message_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&IncomingMessage) -> bool + Send + Sync + 'static,
    {
        self.message_filter = Some(Arc::new(filter));
        self
    }
}

impl fmt::Debug for DispatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchConfig")
            .field("commands_dir", &self.commands_dir)
            .field("prefix", &self.prefix)
            .field("owners", &self.owners)
            .field("middlewares", &self.middlewares.len())
            .field("extensions", &self.extensions)
            .field("disable_mention_prefix", &self.disable_mention_prefix)
            .field("bot_id", &self.bot_id)
            .field("message_filter", &self.message_filter.is_some())
            .finish()
    }
}

/// Settings read from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub commands_dir: PathBuf,
    pub prefix: String,
    /// Per-server prefix overrides as (server id, prefix)
    pub server_prefixes: Vec<(String, String)>,
    pub owner_ids: Vec<String>,
    pub extensions: Vec<String>,
    pub disable_mention_prefix: bool,
    pub log_level: String,
    pub discord_token: Option<String>,
    pub console_user_id: String,
}

impl Settings {
    /// Read and validate settings from the environment
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        let commands_dir = PathBuf::from(
            env::var("COMMANDS_DIR").map_err(|_| anyhow!("COMMANDS_DIR must be set"))?,
        );
        if !commands_dir.is_dir() {
            return Err(anyhow!(
                "COMMANDS_DIR {} is not a directory",
                commands_dir.display()
            ));
        }

        let prefix = env::var("BOT_PREFIX").unwrap_or_else(|_| "!".to_string());
        if prefix.trim().is_empty() {
            return Err(anyhow!("BOT_PREFIX must not be empty"));
        }

        let extensions = env::var("COMMAND_EXTENSIONS")
            .map(|raw| parse_list(&raw))
            .unwrap_or_else(|_| default_extensions());
        if extensions.is_empty() {
            return Err(anyhow!("COMMAND_EXTENSIONS must list at least one extension"));
        }

        Ok(Self {
            commands_dir,
            prefix,
            server_prefixes: parse_server_prefixes(&env::var("SERVER_PREFIXES").unwrap_or_default())?,
            owner_ids: parse_list(&env::var("OWNER_IDS").unwrap_or_default()),
            extensions,
            disable_mention_prefix: match env::var("DISABLE_MENTION_PREFIX") {
                Ok(raw) => parse_bool(&raw)
                    .ok_or_else(|| anyhow!("DISABLE_MENTION_PREFIX must be a boolean, got '{raw}'"))?,
                Err(_) => false,
            },
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            discord_token: env::var("DISCORD_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            console_user_id: env::var("CONSOLE_USER_ID").unwrap_or_else(|_| "console".to_string()),
        })
    }

    /// The Discord token, required by the Discord binary only
    pub fn require_discord_token(&self) -> Result<&str> {
        self.discord_token
            .as_deref()
            .ok_or_else(|| anyhow!("DISCORD_TOKEN must be set"))
    }

    /// Prefix built from `BOT_PREFIX` and `SERVER_PREFIXES`
    pub fn prefix(&self) -> Prefix {
        if self.server_prefixes.is_empty() {
            return Prefix::Static(self.prefix.clone());
        }
        self.server_prefixes
            .iter()
            .fold(ServerPrefixes::new(self.prefix.clone()), |prefixes, (server, prefix)| {
                prefixes.with_override(server.clone(), prefix.clone())
            })
            .into_prefix()
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig::new(self.commands_dir.clone())
            .prefix(self.prefix())
            .owners(self.owner_ids.iter().cloned())
            .extensions(self.extensions.iter().cloned())
            .disable_mention_prefix(self.disable_mention_prefix)
    }
}

/// Comma-separated list, blanks dropped
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// `server=prefix,server=prefix`
pub fn parse_server_prefixes(raw: &str) -> Result<Vec<(String, String)>> {
    parse_list(raw)
        .into_iter()
        .map(|pair| {
            let (server, prefix) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("Invalid SERVER_PREFIXES entry '{pair}', expected server=prefix"))?;
            let (server, prefix) = (server.trim(), prefix.trim());
            if server.is_empty() || prefix.is_empty() {
                return Err(anyhow!("Invalid SERVER_PREFIXES entry '{pair}', expected server=prefix"));
            }
            Ok((server.to_string(), prefix.to_string()))
        })
        .collect()
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(" 1, 2,,3 "), vec!["1", "2", "3"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_parse_server_prefixes() {
        let parsed = parse_server_prefixes("111=?, 222 = $").unwrap();
        assert_eq!(
            parsed,
            vec![
                ("111".to_string(), "?".to_string()),
                ("222".to_string(), "$".to_string())
            ]
        );
        assert!(parse_server_prefixes("111").is_err());
        assert!(parse_server_prefixes("=?").is_err());
        assert!(parse_server_prefixes("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_dispatch_config_defaults() {
        let config = DispatchConfig::new("/tmp/commands");
        assert_eq!(config.extensions, vec!["yaml", "yml", "json"]);
        assert!(!config.disable_mention_prefix);
        assert!(config.bot_id.is_none());
        assert!(matches!(config.prefix, Prefix::Static(ref p) if p == "!"));
    }

    #[tokio::test]
    async fn test_settings_prefix_with_overrides() {
        let settings = Settings {
            commands_dir: PathBuf::from("/tmp"),
            prefix: "!".to_string(),
            server_prefixes: vec![("s1".to_string(), "?".to_string())],
            owner_ids: vec!["1".to_string()],
            extensions: default_extensions(),
            disable_mention_prefix: true,
            log_level: "info".to_string(),
            discord_token: None,
            console_user_id: "console".to_string(),
        };

        let prefix = settings.prefix();
        assert_eq!(prefix.resolve(Some("s1")).await.unwrap(), "?");
        assert_eq!(prefix.resolve(Some("s2")).await.unwrap(), "!");
        assert!(settings.require_discord_token().is_err());

        let config = settings.dispatch_config();
        assert_eq!(config.owners, vec!["1"]);
        assert!(config.disable_mention_prefix);
    }
}
