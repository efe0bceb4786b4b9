//! # Core Module
//!
//! Configuration and reply utilities shared by the library and the binaries.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Dispatch configuration and reply splitting
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod response;

pub use config::{DispatchConfig, MessageFilter, Settings};
pub use response::{split_reply, MESSAGE_LIMIT};
