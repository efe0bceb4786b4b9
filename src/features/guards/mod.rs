//! # Feature: Guards
//!
//! Ordered pre-execution predicates attached to commands. Guards declared by
//! a command (in its type or manifest) run first, then guards attached at
//! runtime.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false

pub mod evaluator;

pub use evaluator::{GuardEvaluator, GuardVerdict};
