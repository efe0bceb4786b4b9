//! # Feature: Cooldowns
//!
//! Per-command, per-user minimum interval between successful invocations.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod tracker;

pub use tracker::CooldownTracker;
