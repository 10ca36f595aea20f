//! Process-wide server session.
//!
//! Entry points never reach for a global connection; they take a
//! `&dyn P4Server` explicitly. The [`SessionManager`] is what owns the one
//! shared handle: it connects through an injected [`Connector`] on first use,
//! hands out clones of the same `Arc` afterwards, and drops it on shutdown.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::server::{P4Server, ServerResult};

/// Opens a session against a server.
#[mockall::automock]
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> ServerResult<Arc<dyn P4Server>>;
}

pub struct SessionManager {
    connector: Box<dyn Connector>,
    session: Mutex<Option<Arc<dyn P4Server>>>,
}

impl SessionManager {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            session: Mutex::new(None),
        }
    }

    /// Shared server handle, connecting on first use.
    ///
    /// A failed connect leaves the manager disconnected; the next call tries
    /// again.
    pub async fn session(&self) -> ServerResult<Arc<dyn P4Server>> {
        let mut guard = self.session.lock().await;
        if let Some(server) = guard.as_ref() {
            return Ok(Arc::clone(server));
        }

        debug!("opening server session");
        let server = self.connector.connect().await?;
        *guard = Some(Arc::clone(&server));
        info!("server session established");
        Ok(server)
    }

    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Drop the shared handle. Outstanding clones stay usable until their
    /// holders release them; the next [`SessionManager::session`] reconnects.
    pub async fn shutdown(&self) {
        if self.session.lock().await.take().is_some() {
            info!("server session closed");
        }
    }
}
