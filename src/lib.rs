// Core layer - shared types and configuration
pub mod core;

// Command units, discovery and registry
pub mod commands;

// Features layer - cooldowns, guards, middleware, owners
pub mod features;

// Application layer
pub mod dispatcher;

#[cfg(test)]
mod test_support;

pub use core::{DispatchConfig, Settings};

pub use commands::{
    Command, CommandCatalog, CommandContext, CommandMetadata, CommandOptions, CommandRegistry,
    Guard, IncomingMessage, Prefix, Replier,
};

pub use dispatcher::{DispatchEngine, DispatchOutcome};

pub use features::{Middleware, Next};
