// Library root — exposes internals for integration tests.
// The binary entry point is src/main.rs.

pub mod bootstrap;
pub mod core;
pub mod llm;
pub mod server;
pub mod store;
pub mod teaching;

pub use bootstrap::logger;
pub use crate::core::{config, error};
