//! Command metadata and the resolver that fills in defaults
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Descriptor options can be layered with manifest overrides
//! - 1.0.0: Initial implementation with name/category defaulting

use serde::{Deserialize, Serialize};

/// Description used when a command does not declare one
pub const DEFAULT_DESCRIPTION: &str = "No description provided";

/// Category used when neither the command nor its directory names one
pub const UNCATEGORIZED: &str = "uncategorized";

/// Suffix stripped from type identifiers when deriving a command name
const TYPE_SUFFIX: &str = "Command";

/// Fully resolved metadata for a registered command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// Canonical name, always lower-case
    pub name: String,
    pub description: String,
    /// Alternate names, lower-case and de-duplicated in declaration order
    pub aliases: Vec<String>,
    /// Permission tags, reserved for the permission interceptor
    pub permissions: Vec<String>,
    pub category: String,
    /// Minimum interval between successful invocations per user (0 = none)
    pub cooldown_ms: u64,
    pub nsfw: bool,
    pub owner_only: bool,
}

impl CommandMetadata {
    /// Whether this command enforces a per-user cooldown
    pub fn has_cooldown(&self) -> bool {
        self.cooldown_ms > 0
    }
}

/// Partially specified command options
///
/// Every field is optional. Commands return these from their static
/// descriptor and manifests deserialize into the same shape, so the two can
/// be layered with [`CommandOptions::overridden_by`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandOptions {
    pub name: Option<String>,
    pub description: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub permissions: Option<Vec<String>>,
    pub category: Option<String>,
    pub cooldown_ms: Option<u64>,
    pub nsfw: Option<bool>,
    pub owner_only: Option<bool>,
}

impl CommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = Some(aliases.into_iter().map(Into::into).collect());
        self
    }

    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = Some(permissions.into_iter().map(Into::into).collect());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn cooldown_ms(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = Some(cooldown_ms);
        self
    }

    pub fn nsfw(mut self, nsfw: bool) -> Self {
        self.nsfw = Some(nsfw);
        self
    }

    pub fn owner_only(mut self, owner_only: bool) -> Self {
        self.owner_only = Some(owner_only);
        self
    }

    /// Layer `overrides` on top of `self`, field by field
    pub fn overridden_by(self, overrides: CommandOptions) -> CommandOptions {
        CommandOptions {
            name: overrides.name.or(self.name),
            description: overrides.description.or(self.description),
            aliases: overrides.aliases.or(self.aliases),
            permissions: overrides.permissions.or(self.permissions),
            category: overrides.category.or(self.category),
            cooldown_ms: overrides.cooldown_ms.or(self.cooldown_ms),
            nsfw: overrides.nsfw.or(self.nsfw),
            owner_only: overrides.owner_only.or(self.owner_only),
        }
    }
}

/// Derive a command name from a type identifier
///
/// `PingCommand` becomes `ping`, `Help` becomes `help`. A bare `Command`
/// identifier is kept as `command` rather than producing an empty name.
pub fn derive_name(type_ident: &str) -> String {
    let stripped = type_ident
        .strip_suffix(TYPE_SUFFIX)
        .filter(|rest| !rest.is_empty())
        .unwrap_or(type_ident);
    stripped.to_lowercase()
}

/// Resolve partial options into complete metadata
///
/// `dir_category` is the category derived from where the command was found
/// on disk, if anywhere. An explicit category always wins over it.
pub fn resolve_metadata(
    type_ident: &str,
    options: CommandOptions,
    dir_category: Option<&str>,
) -> CommandMetadata {
    let name = options
        .name
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| derive_name(type_ident));

    let category = options
        .category
        .filter(|c| !c.trim().is_empty())
        .or_else(|| dir_category.map(str::to_string))
        .unwrap_or_else(|| UNCATEGORIZED.to_string());

    CommandMetadata {
        name,
        description: options
            .description
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        aliases: normalize_aliases(options.aliases.unwrap_or_default()),
        permissions: options.permissions.unwrap_or_default(),
        category,
        cooldown_ms: options.cooldown_ms.unwrap_or(0),
        nsfw: options.nsfw.unwrap_or(false),
        owner_only: options.owner_only.unwrap_or(false),
    }
}

fn normalize_aliases(aliases: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(aliases.len());
    for alias in aliases {
        let alias = alias.trim().to_lowercase();
        if !alias.is_empty() && !seen.contains(&alias) {
            seen.push(alias);
        }
    }
    seen
}
