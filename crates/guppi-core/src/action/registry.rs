//! The action registry: all enabled actions, built once at startup.

use super::function::FunctionAction;
use super::locks::RunLocks;
use super::shell::ShellAction;
use super::types::CapabilityResolver;
use crate::config::{ActionSet, ConfigError};
use crate::event::{Env, Event};
use std::collections::HashSet;
use tracing::error;

/// Owns all enabled actions plus the optional prompt action.
///
/// Built from an [`ActionSet`] and read-only thereafter; share it via `Arc`.
/// The embedded [`RunLocks`] set is the only mutable state.
#[derive(Debug)]
pub struct ActionRegistry {
    function: Vec<FunctionAction>,
    shell: Vec<ShellAction>,
    prompt: Option<FunctionAction>,
    locks: RunLocks,
}

/// A registry lookup result, either variant of action.
#[derive(Debug)]
pub enum ResolvedAction<'a> {
    Function(&'a FunctionAction),
    Shell(&'a ShellAction),
}

impl ActionRegistry {
    /// Build the registry from configured specs, resolving each enabled
    /// function action's capability.
    ///
    /// Disabled specs never enter the registry. Action names must be unique
    /// within their variant group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateAction`] for a repeated name within a
    /// group and whatever the resolver reports for an unknown capability.
    pub fn build(set: ActionSet, resolver: &dyn CapabilityResolver) -> Result<Self, ConfigError> {
        let mut function = Vec::new();
        let mut seen = HashSet::new();
        for spec in &set.actions.function {
            if !spec.enabled {
                continue;
            }
            if !seen.insert(spec.name.clone()) {
                return Err(ConfigError::DuplicateAction {
                    kind: "function",
                    name: spec.name.clone(),
                });
            }
            function.push(FunctionAction::new(&spec.name, resolver.resolve(spec)?));
        }

        let mut shell = Vec::new();
        let mut seen = HashSet::new();
        for spec in &set.actions.shell {
            if !spec.enabled {
                continue;
            }
            if !seen.insert(spec.name.clone()) {
                return Err(ConfigError::DuplicateAction {
                    kind: "shell",
                    name: spec.name.clone(),
                });
            }
            shell.push(ShellAction::new(&spec.name, &spec.command));
        }

        let prompt = match &set.prompt {
            Some(spec) if spec.enabled => {
                Some(FunctionAction::new(&spec.name, resolver.resolve(spec)?))
            }
            _ => None,
        };

        Ok(Self {
            function,
            shell,
            prompt,
            locks: RunLocks::new(),
        })
    }

    /// Look up an action by name, checking function actions first.
    pub fn resolve(&self, name: &str) -> Option<ResolvedAction<'_>> {
        if let Some(action) = self.function.iter().find(|a| a.name() == name) {
            return Some(ResolvedAction::Function(action));
        }
        self.shell
            .iter()
            .find(|a| a.name() == name)
            .map(ResolvedAction::Shell)
    }

    pub fn function_actions(&self) -> &[FunctionAction] {
        &self.function
    }

    pub fn shell_actions(&self) -> &[ShellAction] {
        &self.shell
    }

    pub fn prompt(&self) -> Option<&FunctionAction> {
        self.prompt.as_ref()
    }

    /// The shared in-flight marker set for shell actions.
    pub fn locks(&self) -> &RunLocks {
        &self.locks
    }

    /// Invoke the prompt action, if one is configured and enabled.
    ///
    /// Returns the reply to send back to the client. A failing prompt is
    /// logged and yields `None`; it never blocks fan-out from proceeding.
    pub fn run_prompt(&self, event: &Event, env: &Env) -> Option<String> {
        let prompt = self.prompt.as_ref()?;
        match prompt.invoke(event, env) {
            Ok(reply) => Some(reply),
            Err(err) => {
                error!("Failed to execute prompt action. Reason: {err:#}");
                None
            }
        }
    }
}
