//! # Features Layer
//!
//! Per-invocation policy used by the dispatcher: cooldowns, guards,
//! middleware and the owner set.

pub mod cooldowns;
pub mod guards;
pub mod middleware;
pub mod owners;

pub use cooldowns::CooldownTracker;
pub use guards::{GuardEvaluator, GuardVerdict};
pub use middleware::{Middleware, Next, PermissionCheck};
pub use owners::OwnerSet;
