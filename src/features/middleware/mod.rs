//! # Feature: Middleware
//!
//! Interceptors wrapped around command execution. The dispatcher always puts
//! [`PermissionCheck`] first, followed by the globally configured middlewares,
//! and ends the chain in the command's `run`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false

pub mod chain;

pub use chain::{run_chain, Middleware, Next, PermissionCheck};
