//! Built-in command bodies and guards
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 3.0.0: Text commands (ping, help, say) and the server-only guard, registered through the catalog
//! - 2.0.0: Consolidated handlers
//! - 1.0.0: Initial extraction from the monolithic handler

pub mod guards;
pub mod utility;

pub use guards::ServerOnlyGuard;
pub use utility::{HelpCommand, PingCommand, SayCommand};

use super::catalog::CommandCatalog;

/// Register every built-in command and guard with a catalog
pub fn register_builtins(catalog: &mut CommandCatalog) {
    catalog
        .register_default::<PingCommand>()
        .register_default::<HelpCommand>()
        .register_command("SayCommand", SayCommand::from_manifest)
        .register_default_guard::<ServerOnlyGuard>();
}
