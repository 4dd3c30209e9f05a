//! YAML configuration loading.
//!
//! The config file (default `~/.guppi.yaml`) declares which actions exist
//! and whether they are enabled. Enablement is decided once at startup and
//! is immutable for the daemon's lifetime; there is no hot reload.
//!
//! ```yaml
//! prompt:
//!   name: prompt
//!   enabled: true
//! actions:
//!   function:
//!     - name: record
//!       enabled: true
//!   shell:
//!     - name: notify
//!       command: "notify-send {summary}"
//!       enabled: true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The full set of configured action specs consumed by
/// [`ActionRegistry::build`](crate::action::ActionRegistry::build).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionSet {
    /// At most one action designated as the prompt. Its result is echoed
    /// back to the connecting client before fan-out begins.
    #[serde(default)]
    pub prompt: Option<FunctionSpec>,
    #[serde(default)]
    pub actions: Actions,
}

/// Configured fan-out actions, grouped by variant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Actions {
    #[serde(default)]
    pub function: Vec<FunctionSpec>,
    #[serde(default)]
    pub shell: Vec<ShellSpec>,
}

/// Declaration of a function-backed action. The name doubles as the lookup
/// key for capability resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Declaration of a shell-backed action with a `{field}` command template.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellSpec {
    pub name: String,
    pub command: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Configuration and registry-build failures. All of these are fatal at
/// startup; the process exits before serving.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("duplicate {kind} action name '{name}'")]
    DuplicateAction { kind: &'static str, name: String },
    #[error("no capability registered for function action '{0}'")]
    UnknownFunction(String),
}

impl ActionSet {
    /// Load and parse the YAML config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is not valid YAML for this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
