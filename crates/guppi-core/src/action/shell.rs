//! Shell-backed actions: a name plus a `{field}` command template.

use super::locks::RunLocks;
use super::types::{ActionError, ActionOutcome};
use crate::event::{Env, Event};
use crate::template;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{error, info, warn};

/// A named action that renders its command template against the event and
/// runs it through `sh -c`.
#[derive(Debug, Clone)]
pub struct ShellAction {
    name: String,
    command: String,
}

impl ShellAction {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Run the command with timing, error isolation, and non-reentrancy
    /// guarding.
    ///
    /// If a previous run of the same action is still in flight, this
    /// invocation is dropped entirely with a warning (drop policy, not a
    /// queue). The lock is released whether the command succeeds or fails.
    pub async fn execute(&self, event: &Event, _env: &Env, locks: &RunLocks) -> ActionOutcome {
        let Some(_guard) = locks.acquire(&self.name) else {
            warn!(
                "Action '{}' is still running from a previous execution",
                self.name
            );
            return ActionOutcome::Skipped;
        };

        let start = Instant::now();
        match self.run(event).await {
            Ok(stdout) => {
                info!(
                    "Executing shell action '{}' took {:.2} seconds",
                    self.name,
                    start.elapsed().as_secs_f64()
                );
                ActionOutcome::Output(stdout)
            }
            Err(err) => {
                error!(
                    "Failed to execute shell action '{}'. Reason: {err}",
                    self.name
                );
                ActionOutcome::Failed
            }
        }
    }

    /// Render the template and run the command, returning trimmed stdout.
    async fn run(&self, event: &Event) -> Result<String, ActionError> {
        let cmd = template::render(&self.command, event)?;

        let output = Command::new("sh")
            .arg("-c")
            .arg(&cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(ActionError::Spawn)?;

        if !output.status.success() {
            return Err(ActionError::NonZeroExit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr)
                    .trim_end()
                    .to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .trim_end()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn event(json: &str) -> Event {
        Event::decode(json.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn echo_substitutes_and_trims() {
        let action = ShellAction::new("echo", "echo {x}");
        let locks = RunLocks::new();
        let outcome = action
            .execute(&event(r#"{"x":"hi"}"#), &Env::new(), &locks)
            .await;
        assert_eq!(outcome, ActionOutcome::Output("hi".to_string()));
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_failure() {
        let action = ShellAction::new("fail", "echo diagnostics >&2; exit 3");
        let locks = RunLocks::new();
        let outcome = action.execute(&event("{}"), &Env::new(), &locks).await;
        assert_eq!(outcome, ActionOutcome::Failed);
    }

    #[tokio::test]
    async fn missing_template_field_is_a_failure() {
        let action = ShellAction::new("notify", "notify-send {summary}");
        let locks = RunLocks::new();
        let outcome = action.execute(&event("{}"), &Env::new(), &locks).await;
        assert_eq!(outcome, ActionOutcome::Failed);
    }

    #[tokio::test]
    async fn busy_action_is_skipped() {
        let action = ShellAction::new("slow", "sleep 5");
        let locks = RunLocks::new();
        let _held = locks.acquire("slow").unwrap();
        let outcome = action.execute(&event("{}"), &Env::new(), &locks).await;
        assert_eq!(outcome, ActionOutcome::Skipped);
    }

    #[tokio::test]
    async fn lock_released_after_success() {
        let action = ShellAction::new("quick", "true");
        let locks = RunLocks::new();
        action.execute(&event("{}"), &Env::new(), &locks).await;
        assert!(!locks.is_held("quick"));
    }

    /// Regression test: a failing run must not permanently lock the action
    /// out of future executions.
    #[tokio::test]
    async fn lock_released_after_failure() {
        let locks = RunLocks::new();

        let failing = ShellAction::new("notify", "exit 1");
        assert_eq!(
            failing.execute(&event("{}"), &Env::new(), &locks).await,
            ActionOutcome::Failed
        );
        assert!(!locks.is_held("notify"));

        // The same action name runs again afterwards.
        let recovered = ShellAction::new("notify", "echo back");
        assert_eq!(
            recovered.execute(&event("{}"), &Env::new(), &locks).await,
            ActionOutcome::Output("back".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_duplicate_is_dropped_then_recovers() {
        let action = ShellAction::new("slow", "sleep 0.3 && echo done");
        let locks = std::sync::Arc::new(RunLocks::new());
        let e = event("{}");

        let first = {
            let action = action.clone();
            let locks = locks.clone();
            let e = e.clone();
            tokio::spawn(async move { action.execute(&e, &Env::new(), &locks).await })
        };

        // Give the first invocation time to take the lock and start sleeping.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = action.execute(&e, &Env::new(), &locks).await;
        assert_eq!(second, ActionOutcome::Skipped);

        let first = first.await.unwrap();
        assert_eq!(first, ActionOutcome::Output("done".to_string()));

        // After the first completes the action is invokable again.
        let third = action.execute(&e, &Env::new(), &locks).await;
        assert_eq!(third, ActionOutcome::Output("done".to_string()));
    }
}
