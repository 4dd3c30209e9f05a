//! The guppi daemon: a Unix socket dispatch server for shell automation.
//!
//! Library surface for the `guppi` binary and for integration tests:
//! the dispatch server with its two bounded concurrency pools, per
//! connection protocol handling, and compiled-in capability resolution
//! for function actions.

pub mod daemon;
pub mod resolver;
