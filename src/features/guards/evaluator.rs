//! Guard evaluation
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0

use dashmap::DashMap;
use log::{debug, warn};
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::Guard;
use crate::commands::registry::RegisteredCommand;

/// Result of running a command's guards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    /// Every guard agreed
    Pass,
    /// A guard said no (or failed); carries its name
    Reject(String),
}

/// Runs a command's guards in order and gives feedback on rejection
///
/// Holds guards attached at runtime, keyed by command name. These survive a
/// registry reload because they are not part of any command unit.
#[derive(Default)]
pub struct GuardEvaluator {
    attached: DashMap<String, Vec<Arc<dyn Guard>>>,
}

impl GuardEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a guard to a command by canonical name
    pub fn attach(&self, command: &str, guard: Arc<dyn Guard>) {
        self.attached
            .entry(command.to_lowercase())
            .or_default()
            .push(guard);
    }

    /// Drop every guard attached to a command
    pub fn detach_all(&self, command: &str) {
        self.attached.remove(&command.to_lowercase());
    }

    /// Full guard list for a command, in evaluation order
    pub fn guards_for(&self, entry: &RegisteredCommand) -> Vec<Arc<dyn Guard>> {
        let mut guards = entry.guards().to_vec();
        if let Some(extra) = self.attached.get(entry.name()) {
            guards.extend(extra.iter().cloned());
        }
        guards
    }

    /// Run the guards, stopping at the first rejection
    ///
    /// A guard that errors counts as a rejection. The rejecting guard's
    /// `guard_fail` gives the user feedback; failing that, the command's
    /// `on_guard_fail`. With neither, the rejection is only logged.
    pub async fn evaluate(&self, entry: &RegisteredCommand, ctx: &CommandContext) -> GuardVerdict {
        for guard in self.guards_for(entry) {
            let passed = match guard.run(ctx).await {
                Ok(passed) => passed,
                Err(e) => {
                    warn!("Guard '{}' failed on '{}': {:#}", guard.name(), entry.name(), e);
                    false
                }
            };
            if passed {
                continue;
            }

            debug!("Guard '{}' rejected '{}' for {}", guard.name(), entry.name(), ctx.author_id);
            self.give_feedback(guard.as_ref(), entry, ctx).await;
            return GuardVerdict::Reject(guard.name().to_string());
        }
        GuardVerdict::Pass
    }

    async fn give_feedback(&self, guard: &dyn Guard, entry: &RegisteredCommand, ctx: &CommandContext) {
        match guard.guard_fail(ctx).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => warn!("Guard '{}' failure handler errored: {:#}", guard.name(), e),
        }

        match entry.command().on_guard_fail(ctx).await {
            Ok(true) => {}
            Ok(false) => warn!(
                "Guard '{}' rejected '{}' without a failure handler, no reply sent",
                guard.name(),
                entry.name()
            ),
            Err(e) => warn!("Command '{}' guard failure handler errored: {:#}", entry.name(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::metadata::{resolve_metadata, CommandOptions};
    use crate::test_support::{context_for, RecordingReplier, ScriptedCommand, ScriptedGuard};

    fn entry(guards: Vec<Arc<dyn Guard>>) -> RegisteredCommand {
        let meta = resolve_metadata("KickCommand", CommandOptions::new(), None);
        RegisteredCommand::new(ScriptedCommand::ok(), meta).with_guards(guards)
    }

    fn ctx(replier: Arc<RecordingReplier>) -> CommandContext {
        context_for("!kick", "kick", &[], replier, Default::default())
    }

    #[tokio::test]
    async fn test_all_guards_pass() {
        let first = ScriptedGuard::pass("first");
        let second = ScriptedGuard::pass("second");
        let entry = entry(vec![first.clone() as Arc<dyn Guard>, second.clone()]);
        let replier = RecordingReplier::new();

        let verdict = GuardEvaluator::new().evaluate(&entry, &ctx(replier.clone())).await;

        assert_eq!(verdict, GuardVerdict::Pass);
        assert_eq!((first.calls(), second.calls()), (1, 1));
        assert!(replier.replies().is_empty());
    }

    #[tokio::test]
    async fn test_first_rejection_short_circuits_with_feedback() {
        let first = ScriptedGuard::new("first", Ok(false), Some("nope"));
        let second = ScriptedGuard::pass("second");
        let entry = entry(vec![first.clone() as Arc<dyn Guard>, second.clone()]);
        let replier = RecordingReplier::new();

        let verdict = GuardEvaluator::new().evaluate(&entry, &ctx(replier.clone())).await;

        assert_eq!(verdict, GuardVerdict::Reject("first".to_string()));
        assert_eq!(second.calls(), 0);
        assert_eq!(replier.replies(), vec!["nope"]);
    }

    #[tokio::test]
    async fn test_erroring_guard_rejects() {
        let broken = ScriptedGuard::new("broken", Err("db down".to_string()), Some("try later"));
        let entry = entry(vec![broken as Arc<dyn Guard>]);
        let replier = RecordingReplier::new();

        let verdict = GuardEvaluator::new().evaluate(&entry, &ctx(replier.clone())).await;

        assert_eq!(verdict, GuardVerdict::Reject("broken".to_string()));
        assert_eq!(replier.replies(), vec!["try later"]);
    }

    #[tokio::test]
    async fn test_rejection_without_handler_is_silent() {
        let entry = entry(vec![ScriptedGuard::new("quiet", Ok(false), None) as Arc<dyn Guard>]);
        let replier = RecordingReplier::new();

        let verdict = GuardEvaluator::new().evaluate(&entry, &ctx(replier.clone())).await;

        assert_eq!(verdict, GuardVerdict::Reject("quiet".to_string()));
        assert!(replier.replies().is_empty());
    }

    #[tokio::test]
    async fn test_attached_guards_run_after_declared() {
        let declared = ScriptedGuard::pass("declared");
        let attached = ScriptedGuard::new("attached", Ok(false), Some("attached said no"));
        let entry = entry(vec![declared.clone() as Arc<dyn Guard>]);
        let evaluator = GuardEvaluator::new();
        evaluator.attach("KICK", attached.clone());

        let names: Vec<_> = evaluator.guards_for(&entry).iter().map(|g| g.name().to_string()).collect();
        assert_eq!(names, vec!["declared", "attached"]);

        let replier = RecordingReplier::new();
        let verdict = evaluator.evaluate(&entry, &ctx(replier.clone())).await;
        assert_eq!(verdict, GuardVerdict::Reject("attached".to_string()));
        assert_eq!(declared.calls(), 1);

        evaluator.detach_all("kick");
        assert_eq!(evaluator.guards_for(&entry).len(), 1);
    }
}
