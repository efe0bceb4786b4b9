//! # Command System
//!
//! Command units, their metadata, discovery from disk and the registry.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Prefix commands discovered from manifest units, catalog of command types
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod catalog;
pub mod context;
pub mod discovery;
pub mod handler;
pub mod handlers;
pub mod metadata;
pub mod parser;
pub mod registry;

pub use catalog::CommandCatalog;
pub use context::{CommandContext, IncomingMessage, Replier};
pub use discovery::CommandManifest;
pub use handler::{Command, Guard};
pub use metadata::{resolve_metadata, CommandMetadata, CommandOptions};
pub use parser::{Prefix, PrefixResolver, ServerPrefixes};
pub use registry::{CommandRegistry, LoadSummary, RegisteredCommand};
