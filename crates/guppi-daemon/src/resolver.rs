//! Compiled-in capability resolution for function actions.
//!
//! The original design loads handler code dynamically; here the daemon
//! carries a compiled-in name → callable map instead. Embedders (and tests)
//! register callables before the registry is built; configuration then
//! enables them by name.

use guppi_core::action::{ActionError, Callable, CapabilityResolver};
use guppi_core::config::{ConfigError, FunctionSpec};
use guppi_core::event::{Env, Event};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Resolver backed by a compiled-in callable map.
#[derive(Default)]
pub struct BuiltinResolver {
    callables: HashMap<String, Arc<dyn Callable>>,
}

impl BuiltinResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver pre-populated with the stock callables shipped with the
    /// daemon.
    pub fn with_builtins() -> Self {
        let mut resolver = Self::new();
        resolver.register("log_event", Arc::new(log_event));
        resolver
    }

    /// Register a callable under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, callable: Arc<dyn Callable>) {
        self.callables.insert(name.into(), callable);
    }
}

impl CapabilityResolver for BuiltinResolver {
    fn resolve(&self, spec: &FunctionSpec) -> Result<Arc<dyn Callable>, ConfigError> {
        self.callables
            .get(&spec.name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownFunction(spec.name.clone()))
    }
}

/// Stock callable: log the event and return its JSON rendering.
fn log_event(event: &Event, _env: &Env) -> Result<String, ActionError> {
    let rendered = serde_json::to_string(event).map_err(|e| ActionError::Callable(e.into()))?;
    info!("Received event: {rendered}");
    Ok(rendered)
}
