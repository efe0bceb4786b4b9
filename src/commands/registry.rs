//! Command registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Alias and category indices, first-registration-wins conflicts, directory loading
//! - 1.0.0: Initial implementation for handler dispatch

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::catalog::CommandCatalog;
use super::discovery::{self, DiscoveredUnit};
use super::handler::{Command, Guard};
use super::metadata::{resolve_metadata, CommandMetadata};

/// A command instance together with its resolved metadata
///
/// Built once during loading and never mutated afterwards; a reload
/// replaces the whole entry.
pub struct RegisteredCommand {
    command: Arc<dyn Command>,
    metadata: CommandMetadata,
    guards: Vec<Arc<dyn Guard>>,
}

impl RegisteredCommand {
    pub fn new(command: Arc<dyn Command>, metadata: CommandMetadata) -> Self {
        let guards = command.guards();
        Self {
            command,
            metadata,
            guards,
        }
    }

    /// Append guards declared outside the command type (e.g. in a manifest)
    pub fn with_guards(mut self, guards: Vec<Arc<dyn Guard>>) -> Self {
        self.guards.extend(guards);
        self
    }

    pub fn command(&self) -> &Arc<dyn Command> {
        &self.command
    }

    pub fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Guards declared for this command, in evaluation order
    pub fn guards(&self) -> &[Arc<dyn Guard>] {
        &self.guards
    }
}

impl fmt::Debug for RegisteredCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCommand")
            .field("metadata", &self.metadata)
            .field("guards", &self.guards.iter().map(|g| g.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Outcome counters for a directory load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Commands inserted into the registry
    pub loaded: usize,
    /// Units that were marked as commands but could not be instantiated
    pub skipped: usize,
    /// Commands dropped because their name was already taken
    pub conflicts: usize,
}

/// Registry of commands keyed by lower-case name, with an alias index
///
/// Invariant: every key of `aliases` is absent from `commands`, and every
/// alias points at a key of `commands`.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<RegisteredCommand>>,
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under its resolved metadata
    ///
    /// Returns `false` and leaves the registry untouched if the name is
    /// already taken by a command or an alias. Aliases that are already taken
    /// are skipped one by one without rejecting the command.
    pub fn register(&mut self, command: Arc<dyn Command>, metadata: CommandMetadata) -> bool {
        self.insert(RegisteredCommand::new(command, metadata))
    }

    /// Register a fully built entry
    pub fn insert(&mut self, entry: RegisteredCommand) -> bool {
        let name = entry.metadata.name.to_lowercase();

        if self.commands.contains_key(&name) {
            warn!("Command '{name}' is already registered, ignoring duplicate");
            return false;
        }
        if let Some(owner) = self.aliases.get(&name) {
            warn!("Command name '{name}' is already an alias of '{owner}', ignoring command");
            return false;
        }

        let mut accepted = Vec::with_capacity(entry.metadata.aliases.len());
        for alias in &entry.metadata.aliases {
            let alias = alias.to_lowercase();
            if alias == name || accepted.contains(&alias) {
                continue;
            }
            if self.commands.contains_key(&alias) {
                warn!("Alias '{alias}' of '{name}' collides with a command name, skipping alias");
                continue;
            }
            if let Some(owner) = self.aliases.get(&alias) {
                warn!("Alias '{alias}' of '{name}' already belongs to '{owner}', skipping alias");
                continue;
            }
            accepted.push(alias);
        }

        for alias in accepted {
            self.aliases.insert(alias, name.clone());
        }
        debug!("Registered command '{name}'");
        self.commands.insert(name, Arc::new(entry));
        true
    }

    /// Look up a command by name or alias, case-insensitively
    pub fn get(&self, name_or_alias: &str) -> Option<Arc<RegisteredCommand>> {
        let key = name_or_alias.to_lowercase();
        let canonical = self.aliases.get(&key).unwrap_or(&key);
        self.commands.get(canonical).cloned()
    }

    /// Check if a name or alias resolves to a command
    pub fn has(&self, name_or_alias: &str) -> bool {
        self.get(name_or_alias).is_some()
    }

    /// All commands, sorted by name
    pub fn get_all(&self) -> Vec<Arc<RegisteredCommand>> {
        let mut all: Vec<_> = self.commands.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Metadata of all commands, sorted by name
    pub fn get_all_metadata(&self) -> Vec<CommandMetadata> {
        self.get_all()
            .iter()
            .map(|entry| entry.metadata.clone())
            .collect()
    }

    /// Commands in a category (case-insensitive), sorted by name
    pub fn get_by_category(&self, category: &str) -> Vec<Arc<RegisteredCommand>> {
        self.get_all()
            .into_iter()
            .filter(|entry| entry.metadata.category.eq_ignore_ascii_case(category))
            .collect()
    }

    /// Commands grouped by category name
    pub fn categories(&self) -> BTreeMap<String, Vec<Arc<RegisteredCommand>>> {
        let mut grouped: BTreeMap<String, Vec<Arc<RegisteredCommand>>> = BTreeMap::new();
        for entry in self.get_all() {
            grouped
                .entry(entry.metadata.category.clone())
                .or_default()
                .push(entry);
        }
        grouped
    }

    /// Number of registered commands (aliases are not counted)
    pub fn size(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Remove every command and alias
    pub fn clear(&mut self) {
        self.commands.clear();
        self.aliases.clear();
    }

    /// Discover and register every command unit under `root`
    ///
    /// Units that fail to load are logged and skipped; only an unreadable
    /// root is an error.
    pub async fn load_from_directory(
        &mut self,
        root: &Path,
        extensions: &[String],
        catalog: &CommandCatalog,
    ) -> Result<LoadSummary> {
        let metadata = tokio::fs::metadata(root)
            .await
            .map_err(|e| anyhow!("Cannot read commands directory {}: {}", root.display(), e))?;
        if !metadata.is_dir() {
            return Err(anyhow!("Commands path {} is not a directory", root.display()));
        }

        let units = discovery::discover_units(root, extensions).await?;
        let mut summary = LoadSummary::default();

        for unit in units {
            self.load_unit(&unit, catalog, &mut summary).await;
        }

        info!(
            "Loaded {} command(s) from {} ({} skipped, {} conflicts)",
            summary.loaded,
            root.display(),
            summary.skipped,
            summary.conflicts
        );
        Ok(summary)
    }

    async fn load_unit(
        &mut self,
        unit: &DiscoveredUnit,
        catalog: &CommandCatalog,
        summary: &mut LoadSummary,
    ) {
        let manifests = match discovery::read_manifests(&unit.path).await {
            Ok(manifests) => manifests,
            Err(e) => {
                error!("Failed to load command unit {}: {:#}", unit.path.display(), e);
                summary.skipped += 1;
                return;
            }
        };

        if manifests.is_empty() {
            debug!("{} declares no commands, ignoring", unit.path.display());
        }

        for manifest in manifests {
            if !catalog.has_command(&manifest.command) {
                warn!(
                    "{}: '{}' has no executable entry point, skipping",
                    unit.path.display(),
                    manifest.command
                );
                summary.skipped += 1;
                continue;
            }

            let built = catalog.instantiate(&manifest).and_then(|command| {
                let guards = catalog.instantiate_guards(&manifest.guards)?;
                Ok((command, guards))
            });
            let (command, guards) = match built {
                Ok(built) => built,
                Err(e) => {
                    error!(
                        "{}: failed to instantiate '{}': {:#}",
                        unit.path.display(),
                        manifest.command,
                        e
                    );
                    summary.skipped += 1;
                    continue;
                }
            };

            let options = command.options().overridden_by(manifest.options.clone());
            let metadata = resolve_metadata(&manifest.command, options, Some(&unit.category));
            let entry = RegisteredCommand::new(command, metadata).with_guards(guards);

            if self.insert(entry) {
                summary.loaded += 1;
            } else {
                summary.conflicts += 1;
            }
        }
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .finish()
    }
}
