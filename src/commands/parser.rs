//! Prefix resolution and message parsing
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Mention prefixes (`<@id>` / `<@!id>`) addressed to the bot
//! - 1.0.0: Literal prefixes, static or resolved per server

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Resolves the prefix for a server
#[async_trait]
pub trait PrefixResolver: Send + Sync {
    async fn resolve(&self, server_id: Option<&str>) -> Result<String>;
}

/// Command prefix: fixed, or resolved per server
#[derive(Clone)]
pub enum Prefix {
    Static(String),
    Dynamic(Arc<dyn PrefixResolver>),
}

impl Prefix {
    pub async fn resolve(&self, server_id: Option<&str>) -> Result<String> {
        match self {
            Prefix::Static(prefix) => Ok(prefix.clone()),
            Prefix::Dynamic(resolver) => resolver.resolve(server_id).await,
        }
    }
}

impl Default for Prefix {
    fn default() -> Self {
        Prefix::Static("!".to_string())
    }
}

impl From<&str> for Prefix {
    fn from(prefix: &str) -> Self {
        Prefix::Static(prefix.to_string())
    }
}

impl From<String> for Prefix {
    fn from(prefix: String) -> Self {
        Prefix::Static(prefix)
    }
}

impl fmt::Debug for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Static(prefix) => f.debug_tuple("Static").field(prefix).finish(),
            Prefix::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Per-server prefix overrides with a fallback
#[derive(Debug, Clone)]
pub struct ServerPrefixes {
    fallback: String,
    overrides: HashMap<String, String>,
}

impl ServerPrefixes {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, server_id: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.overrides.insert(server_id.into(), prefix.into());
        self
    }

    pub fn into_prefix(self) -> Prefix {
        Prefix::Dynamic(Arc::new(self))
    }
}

#[async_trait]
impl PrefixResolver for ServerPrefixes {
    async fn resolve(&self, server_id: Option<&str>) -> Result<String> {
        Ok(server_id
            .and_then(|id| self.overrides.get(id))
            .unwrap_or(&self.fallback)
            .clone())
    }
}

/// Structured result of parsing a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInvocation {
    /// The consumed prefix: the literal prefix or the whole mention token
    pub prefix: String,
    /// Lower-cased first token
    pub command_name: String,
    pub args: Vec<String>,
}

/// Matches a leading mention token addressed to the bot
#[derive(Debug, Clone)]
pub struct MentionMatcher {
    pattern: Regex,
}

impl MentionMatcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(r"^<@!?(\d+)>")?,
        })
    }

    /// Returns the mention token when it leads `content` and names `bot_id`
    pub fn strip<'a>(&self, content: &'a str, bot_id: &str) -> Option<(&'a str, &'a str)> {
        let captures = self.pattern.captures(content)?;
        if captures.get(1)?.as_str() != bot_id {
            return None;
        }
        let token = captures.get(0)?;
        Some((token.as_str(), &content[token.end()..]))
    }
}

/// Parse raw message content into an invocation
///
/// `mention` is `(matcher, bot_id)` when mention prefixes are enabled and
/// the bot's identity is known. Returns `None` for anything that is not a
/// command, which is the normal outcome for most chat traffic.
pub fn parse_message(
    content: &str,
    prefix: &str,
    mention: Option<(&MentionMatcher, &str)>,
) -> Option<ParsedInvocation> {
    let (consumed, remainder) = if !prefix.is_empty() && content.starts_with(prefix) {
        (prefix, &content[prefix.len()..])
    } else {
        let (matcher, bot_id) = mention?;
        matcher.strip(content, bot_id)?
    };

    let mut tokens = remainder.split_whitespace();
    let command_name = tokens.next()?.to_lowercase();

    Some(ParsedInvocation {
        prefix: consumed.to_string(),
        command_name,
        args: tokens.map(str::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: &str = "4242";

    fn matcher() -> MentionMatcher {
        MentionMatcher::new().unwrap()
    }

    #[test]
    fn test_parse_simple_command() {
        let parsed = parse_message("!ping", "!", None).unwrap();
        assert_eq!(parsed.prefix, "!");
        assert_eq!(parsed.command_name, "ping");
        assert!(parsed.args.is_empty());
    }

    #[test]
    fn test_parse_arguments() {
        let parsed = parse_message("!ban 123 spam", "!", None).unwrap();
        assert_eq!(parsed.command_name, "ban");
        assert_eq!(parsed.args, vec!["123", "spam"]);
    }

    #[test]
    fn test_parse_non_command() {
        let m = matcher();
        assert_eq!(parse_message("hello", "!", Some((&m, BOT))), None);
        assert_eq!(parse_message("hello", "!", None), None);
    }

    #[test]
    fn test_parse_lowercases_name_and_collapses_whitespace() {
        let parsed = parse_message("!  PiNg   a\t\tB  ", "!", None).unwrap();
        assert_eq!(parsed.command_name, "ping");
        assert_eq!(parsed.args, vec!["a", "B"]);
    }

    #[test]
    fn test_parse_empty_remainder() {
        assert_eq!(parse_message("!", "!", None), None);
        assert_eq!(parse_message("!   ", "!", None), None);
        assert_eq!(parse_message(&format!("<@{BOT}>   "), "!", Some((&matcher(), BOT))), None);
    }

    #[test]
    fn test_parse_multi_char_prefix() {
        let parsed = parse_message("sb!help ping", "sb!", None).unwrap();
        assert_eq!(parsed.prefix, "sb!");
        assert_eq!(parsed.args, vec!["ping"]);
        assert_eq!(parse_message("!help", "sb!", None), None);
    }

    #[test]
    fn test_parse_mention_prefix() {
        let m = matcher();

        let parsed = parse_message(&format!("<@{BOT}> ping now"), "!", Some((&m, BOT))).unwrap();
        assert_eq!(parsed.prefix, format!("<@{BOT}>"));
        assert_eq!(parsed.command_name, "ping");
        assert_eq!(parsed.args, vec!["now"]);

        let nick = parse_message(&format!("<@!{BOT}>help"), "!", Some((&m, BOT))).unwrap();
        assert_eq!(nick.prefix, format!("<@!{BOT}>"));
        assert_eq!(nick.command_name, "help");
    }

    #[test]
    fn test_parse_mention_of_someone_else() {
        let m = matcher();
        assert_eq!(parse_message("<@999> ping", "!", Some((&m, BOT))), None);
        assert_eq!(parse_message(&format!("hey <@{BOT}> ping"), "!", Some((&m, BOT))), None);
    }

    #[test]
    fn test_parse_mention_disabled() {
        assert_eq!(parse_message(&format!("<@{BOT}> ping"), "!", None), None);
    }

    #[tokio::test]
    async fn test_prefix_resolution() {
        assert_eq!(Prefix::from("?").resolve(Some("s1")).await.unwrap(), "?");

        let prefix = ServerPrefixes::new("!").with_override("s1", "$").into_prefix();
        assert_eq!(prefix.resolve(Some("s1")).await.unwrap(), "$");
        assert_eq!(prefix.resolve(Some("s2")).await.unwrap(), "!");
        assert_eq!(prefix.resolve(None).await.unwrap(), "!");
    }
}
