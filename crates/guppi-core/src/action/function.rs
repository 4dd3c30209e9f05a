//! Function-backed actions: a name plus a resolved in-process callable.

use super::types::{ActionOutcome, Callable};
use crate::event::{Env, Event};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// A named action wrapping a resolved callable.
#[derive(Clone)]
pub struct FunctionAction {
    name: String,
    callable: Arc<dyn Callable>,
}

impl FunctionAction {
    pub fn new(name: impl Into<String>, callable: Arc<dyn Callable>) -> Self {
        Self {
            name: name.into(),
            callable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the callable with timing and error isolation.
    ///
    /// A failing callable is logged with the action's name and yields
    /// [`ActionOutcome::Failed`]; it never propagates and never affects
    /// sibling actions.
    pub fn execute(&self, event: &Event, env: &Env) -> ActionOutcome {
        let start = Instant::now();
        match self.callable.call(event, env) {
            Ok(result) => {
                info!(
                    "Executing function action '{}' took {:.2} seconds",
                    self.name,
                    start.elapsed().as_secs_f64()
                );
                ActionOutcome::Output(result)
            }
            Err(err) => {
                error!(
                    "Failed to execute function action '{}'. Reason: {err:#}",
                    self.name
                );
                ActionOutcome::Failed
            }
        }
    }

    /// Invoke the callable directly, surfacing the error.
    ///
    /// Used for the prompt action, whose reply (or failure) is handled by
    /// the connection rather than the fan-out wrapper.
    ///
    /// # Errors
    ///
    /// Returns whatever error the underlying callable produced.
    pub fn invoke(
        &self,
        event: &Event,
        env: &Env,
    ) -> Result<String, super::types::ActionError> {
        self.callable.call(event, env)
    }
}

impl std::fmt::Debug for FunctionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionAction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
