//! Shared action types: the callable contract, outcomes, and errors.

use crate::config::{ConfigError, FunctionSpec};
use crate::event::{Env, Event};
use crate::template::TemplateError;
use std::process::ExitStatus;
use std::sync::Arc;

/// The resolved capability behind a function action.
///
/// How a name becomes a callable (compiled-in registry, embedded scripting,
/// subprocess boundary) is decided outside this crate by a
/// [`CapabilityResolver`]; the registry only consumes the resolved form.
pub trait Callable: Send + Sync {
    /// Invoke the callable against a decoded event.
    ///
    /// # Errors
    ///
    /// Implementations surface any failure as an [`ActionError`]; the
    /// execution wrapper logs it and converts it to "no result".
    fn call(&self, event: &Event, env: &Env) -> Result<String, ActionError>;
}

impl std::fmt::Debug for dyn Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Callable")
    }
}

impl<F> Callable for F
where
    F: Fn(&Event, &Env) -> Result<String, ActionError> + Send + Sync,
{
    fn call(&self, event: &Event, env: &Env) -> Result<String, ActionError> {
        self(event, env)
    }
}

/// Resolves a function-action spec to its in-process callable.
pub trait CapabilityResolver {
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownFunction`] when no capability is
    /// registered under the spec's name.
    fn resolve(&self, spec: &FunctionSpec) -> Result<Arc<dyn Callable>, ConfigError>;
}

/// The result of one wrapped action invocation.
///
/// `Failed` and `Skipped` have already been logged by the wrapper; the cause
/// never propagates to the caller and never affects sibling actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action ran and produced output.
    Output(String),
    /// A shell action was dropped because a previous run of the same action
    /// is still in flight.
    Skipped,
    /// The action failed; details were logged with the action's name.
    Failed,
}

/// Why a single action invocation failed.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("failed to spawn command")]
    Spawn(#[source] std::io::Error),
    #[error("command exited with {status}: {stderr}")]
    NonZeroExit { status: ExitStatus, stderr: String },
    #[error(transparent)]
    Callable(#[from] anyhow::Error),
}
