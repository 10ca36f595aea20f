//! Server seam for the workspace binder.
//!
//! The [`P4Server`] trait is the only way the rest of the crate reaches a
//! Perforce server. It exposes exactly the round-trips the binder and the
//! stream lookup need: client get/create/update and two stream queries.
//! Session set-up, authentication and the wire protocol stay behind the
//! implementation.
//!
//! Two implementations are provided:
//!
//! - [`CommandServer`]: drives the stock `p4` command line client.
//! - [`InMemoryServer`]: a process-local double with the same observable
//!   semantics.
//!
//! # Usage Example
//!
//! ```no_run
//! use p4stream::server::{GetStreamsOptions, P4Server};
//!
//! # async fn example(server: &dyn P4Server) -> Result<(), Box<dyn std::error::Error>> {
//! let opts = GetStreamsOptions::default().with_max_results(10);
//! let streams = server
//!     .get_streams(&["//depot/ma...".to_string()], &opts)
//!     .await?;
//! for summary in streams {
//!     println!("{}", summary.stream);
//! }
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod in_memory;
pub mod types;
pub mod ztag;

use async_trait::async_trait;
use thiserror::Error;

pub use command::{CommandConnector, CommandServer};
pub use in_memory::InMemoryServer;
pub use types::{ClientWorkspace, GetStreamsOptions, Stream, StreamSummary};

/// Operations against a Perforce server.
///
/// Every method is a single request/response round-trip. Implementations
/// must be shareable across tasks; the session manager hands out one
/// `Arc<dyn P4Server>` per process.
#[mockall::automock]
#[async_trait]
pub trait P4Server: Send + Sync {
    /// Fetch a client by exact name.
    ///
    /// # Returns
    /// * `Ok(Some(client))` - The client exists
    /// * `Ok(None)` - No client with that name
    /// * `Err(ServerError)` - The lookup failed
    async fn get_client(&self, name: &str) -> ServerResult<Option<ClientWorkspace>>;

    /// Ask the server to create a client from a (possibly partial) record.
    ///
    /// The server fills in whatever the record leaves out. Creating a name
    /// that already exists fails with [`ServerError::ClientExists`].
    async fn create_client(&self, client: &ClientWorkspace) -> ServerResult<()>;

    /// Persist changes to an existing client.
    async fn update_client(&self, client: &ClientWorkspace) -> ServerResult<()>;

    /// List streams matching any of `paths`.
    ///
    /// Paths may end in the `...` wildcard. Rows come back in server order.
    async fn get_streams(
        &self,
        paths: &[String],
        options: &GetStreamsOptions,
    ) -> ServerResult<Vec<StreamSummary>>;

    /// Fetch the stream record for an exact path, `Ok(None)` if unknown.
    async fn get_stream(&self, path: &str) -> ServerResult<Option<Stream>>;
}

/// Errors raised while talking to the server.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServerError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("p4 {command} failed: {message}")]
    Command { command: String, message: String },

    #[error("Client already exists: {0}")]
    ClientExists(String),

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("Unexpected server output: {0}")]
    Protocol(String),

    /// Refused before reaching the server; the value would be read as an
    /// option or is not a depot path.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_messages() {
        let error = ServerError::Command {
            command: "streams".to_string(),
            message: "Perforce password (P4PASSWD) invalid or unset.".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "p4 streams failed: Perforce password (P4PASSWD) invalid or unset."
        );

        let error = ServerError::Connection("connect to server failed".to_string());
        assert!(error.to_string().starts_with("Connection error"));
    }

    #[tokio::test]
    async fn test_mock_server_returns_configured_client() {
        let mut server = MockP4Server::new();
        server
            .expect_get_client()
            .withf(|name| name == "ws")
            .returning(|name| Ok(Some(ClientWorkspace::new(name))));

        let client = server.get_client("ws").await.unwrap().unwrap();
        assert_eq!(client.name, "ws");
    }
}
