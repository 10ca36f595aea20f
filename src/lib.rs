pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod workspace;

// Re-exports
pub use error::*;
