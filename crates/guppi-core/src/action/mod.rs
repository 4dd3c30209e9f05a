//! The action model and its execution wrappers.
//!
//! An action is a named unit of automation, either a resolved in-process
//! callable ([`FunctionAction`]) or a `{field}` templated shell command
//! ([`ShellAction`]). Every execution goes through a wrapper that records
//! wall-clock duration, isolates failures from sibling actions, and (for
//! shell actions) drops reentrant invocations via [`RunLocks`].
//!
//! The [`ActionRegistry`] owns all enabled actions plus the optional prompt
//! action. It is built once at startup and read-only thereafter; the run
//! lock set is the only shared mutable state.

pub mod function;
pub mod locks;
pub mod registry;
pub mod shell;
pub mod types;

pub use function::FunctionAction;
pub use locks::{RunLockGuard, RunLocks};
pub use registry::{ActionRegistry, ResolvedAction};
pub use shell::ShellAction;
pub use types::{ActionError, ActionOutcome, Callable, CapabilityResolver};
