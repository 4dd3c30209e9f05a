pub mod connection;
pub mod server;

pub use server::{
    DEFAULT_CONNECTION_LIMIT, DEFAULT_EXECUTION_LIMIT, DispatchServer, ServerConfig,
};
