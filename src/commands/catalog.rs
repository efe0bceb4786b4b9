//! Catalog of command and guard factories
//!
//! The catalog is the compile-time half of command discovery: manifests on
//! disk name a type identifier, and the catalog is the only place that can
//! turn that identifier into a live command.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::discovery::CommandManifest;
use super::handler::{short_type_name, Command, Guard};
use super::handlers;

/// Builds a command from its manifest
pub type CommandFactory = Arc<dyn Fn(&CommandManifest) -> Result<Arc<dyn Command>> + Send + Sync>;

/// Builds a guard
pub type GuardFactory = Arc<dyn Fn() -> Arc<dyn Guard> + Send + Sync>;

#[derive(Clone, Default)]
pub struct CommandCatalog {
    commands: HashMap<String, CommandFactory>,
    guards: HashMap<String, GuardFactory>,
}

impl CommandCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-filled with the built-in commands and guards
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        handlers::register_builtins(&mut catalog);
        catalog
    }

    /// Register a factory under a type identifier, replacing any previous one
    pub fn register_command<F>(&mut self, type_name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&CommandManifest) -> Result<Arc<dyn Command>> + Send + Sync + 'static,
    {
        self.commands.insert(type_name.into(), Arc::new(factory));
        self
    }

    /// Register a `Default` command under its short type name
    pub fn register_default<T>(&mut self) -> &mut Self
    where
        T: Command + Default + 'static,
    {
        let type_name = short_type_name(std::any::type_name::<T>());
        self.register_command(type_name, |_| Ok(Arc::new(T::default()) as Arc<dyn Command>))
    }

    /// Register a guard factory under an identifier
    pub fn register_guard<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn Guard> + Send + Sync + 'static,
    {
        self.guards.insert(name.into(), Arc::new(factory));
        self
    }

    /// Register a `Default` guard under its short type name
    pub fn register_default_guard<T>(&mut self) -> &mut Self
    where
        T: Guard + Default + 'static,
    {
        let name = short_type_name(std::any::type_name::<T>());
        self.register_guard(name, || Arc::new(T::default()) as Arc<dyn Guard>)
    }

    pub fn has_command(&self, type_name: &str) -> bool {
        self.commands.contains_key(type_name)
    }

    /// Instantiate the command a manifest names
    pub fn instantiate(&self, manifest: &CommandManifest) -> Result<Arc<dyn Command>> {
        let factory = self
            .commands
            .get(&manifest.command)
            .ok_or_else(|| anyhow!("Unknown command type '{}'", manifest.command))?;
        factory(manifest)
    }

    /// Instantiate guards by identifier, failing on the first unknown one
    pub fn instantiate_guards(&self, names: &[String]) -> Result<Vec<Arc<dyn Guard>>> {
        names
            .iter()
            .map(|name| {
                self.guards
                    .get(name)
                    .map(|factory| factory())
                    .ok_or_else(|| anyhow!("Unknown guard '{}'", name))
            })
            .collect()
    }

    /// Registered command type identifiers, sorted
    pub fn command_types(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for CommandCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut guards: Vec<_> = self.guards.keys().collect();
        guards.sort_unstable();
        f.debug_struct("CommandCatalog")
            .field("commands", &self.command_types())
            .field("guards", &guards)
            .finish()
    }
}
