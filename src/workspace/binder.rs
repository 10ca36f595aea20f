//! Binding a stream workspace to a server-side client.
//!
//! [`bind`] makes sure a client named after the expanded workspace format
//! exists, then points it at the configured stream and owner:
//!
//! 1. expand the name format
//! 2. look the client up by name
//! 3. create it if missing and fetch it back (the server's record is
//!    authoritative, the local partial record is not reused)
//! 4. set owner and stream, unconditionally, and persist
//!
//! The write in step 4 happens even when the values already match, so a
//! client whose owner or stream drifted is repaired on the next bind.
//!
//! `bind` is not atomic. A failure after creation leaves a client that is
//! not yet bound; calling `bind` again finds it in step 2 and finishes the
//! job. Concurrent binds of the same name are not coordinated: the losing
//! create fails with [`ServerError::ClientExists`].

use thiserror::Error;
use tracing::{debug, info, warn};

use super::expand::{has_unresolved, NameExpander};
use super::spec::WorkspaceSpec;
use crate::server::{ClientWorkspace, P4Server, ServerError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("Workspace name format '{format}' expanded to an empty name")]
    EmptyName { format: String },

    #[error("Client {0} is missing after creation")]
    MissingAfterCreate(String),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

pub type BindResult<T> = Result<T, BindError>;

/// Ensure the client for `spec` exists and is bound to its stream and `user`.
pub async fn bind(
    server: &dyn P4Server,
    spec: &WorkspaceSpec,
    user: &str,
    expander: &dyn NameExpander,
) -> BindResult<ClientWorkspace> {
    let client_name = spec.full_name(expander);
    if client_name.is_empty() {
        return Err(BindError::EmptyName {
            format: spec.format().to_string(),
        });
    }
    if has_unresolved(&client_name) {
        warn!("client name {} has unresolved variables", client_name);
    }

    let mut client = match server.get_client(&client_name).await? {
        Some(client) => client,
        None => {
            info!("Creating stream client: {}", client_name);
            server
                .create_client(&ClientWorkspace::new(client_name.as_str()))
                .await?;
            server
                .get_client(&client_name)
                .await?
                .ok_or_else(|| BindError::MissingAfterCreate(client_name.clone()))?
        }
    };

    // Owner is not set during create.
    client.set_owner_name(user);
    client.set_stream(spec.stream_name());
    server.update_client(&client).await?;

    debug!(
        "bound client {} to {} for {}",
        client.name,
        spec.stream_name(),
        user
    );
    Ok(client)
}
