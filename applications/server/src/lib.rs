//! Iseng Server Library
//!
//! HTTP surface of the user service: configuration, error mapping, handlers,
//! router and shutdown handling.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod error;
pub mod routes;
pub mod shutdown;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use routes::create_router;
pub use shutdown::ShutdownReport;
pub use state::AppState;
