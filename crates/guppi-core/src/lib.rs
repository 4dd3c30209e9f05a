//! Core library for guppi, a daemon that automates your shell environment.
//!
//! External triggers (typically a shell hook) deliver one JSON object per
//! connection over a Unix domain socket. The daemon decodes it into an
//! [`event::Event`] and fans it out to every enabled action held by the
//! [`action::ActionRegistry`]: in-process function actions and `{field}`
//! templated shell commands. One designated prompt action may return a reply
//! to the connecting client before fan-out begins.
//!
//! This crate carries everything below the socket: event decoding, template
//! substitution, the action model with its timing/error-isolation/run-lock
//! wrappers, configuration loading, and a small client helper. The socket
//! server itself lives in the `guppi-daemon` crate.

pub mod action;
pub mod client;
pub mod config;
pub mod event;
pub mod template;

pub use action::{
    ActionError, ActionOutcome, ActionRegistry, Callable, CapabilityResolver, FunctionAction,
    ResolvedAction, RunLocks, ShellAction,
};
pub use config::{ActionSet, Actions, ConfigError, FunctionSpec, ShellSpec};
pub use event::{DecodeError, Env, Event, MAX_REQUEST_BYTES};
pub use template::TemplateError;
