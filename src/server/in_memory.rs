//! In-memory server.
//!
//! Holds clients in a DashMap keyed by name and streams in insertion order,
//! so listings come back in a stable "server order". Used by tests and by the
//! command line tool's dry runs; it mirrors the behaviour the binder relies on
//! from a real server:
//!
//! - creating a client fills in a root and never overwrites an existing one
//! - binding a stream regenerates the client view from the stream
//! - `...` at the end of a stream path matches every descendant

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::types::{ClientWorkspace, GetStreamsOptions, Stream, StreamSummary};
use super::{P4Server, ServerError, ServerResult};
use crate::session::Connector;

const WILDCARD: &str = "...";

#[derive(Clone)]
pub struct InMemoryServer {
    clients: Arc<DashMap<String, ClientWorkspace>>,
    streams: Arc<RwLock<Vec<Stream>>>,
    root_base: String,
    creates: Arc<AtomicUsize>,
}

impl Default for InMemoryServer {
    fn default() -> Self {
        Self::new("/p4/clients")
    }
}

impl InMemoryServer {
    /// `root_base` is the directory new client roots are placed under.
    pub fn new(root_base: impl Into<String>) -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
            streams: Arc::new(RwLock::new(Vec::new())),
            root_base: root_base.into(),
            creates: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace the stream list; listings return streams in this order.
    pub fn with_streams<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let streams: Vec<Stream> = paths
            .into_iter()
            .map(|path| Stream::from(StreamSummary::new(path)))
            .collect();
        self.streams = Arc::new(RwLock::new(streams));
        self
    }

    pub async fn add_stream(&self, stream: Stream) {
        self.streams.write().await.push(stream);
    }

    /// Seed a client directly, bypassing the create path.
    pub fn insert_client(&self, client: ClientWorkspace) {
        self.clients.insert(client.name.clone(), client);
    }

    pub fn client(&self, name: &str) -> Option<ClientWorkspace> {
        self.clients.get(name).map(|entry| entry.value().clone())
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Number of successful `create_client` calls so far.
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    fn stream_view(client: &str, stream: &str) -> Vec<String> {
        vec![format!("{}/... //{}/...", stream, client)]
    }
}

fn path_matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_suffix(WILDCARD) {
        Some(prefix) => path.starts_with(prefix),
        None => pattern == path,
    }
}

#[async_trait]
impl P4Server for InMemoryServer {
    async fn get_client(&self, name: &str) -> ServerResult<Option<ClientWorkspace>> {
        Ok(self.client(name))
    }

    async fn create_client(&self, client: &ClientWorkspace) -> ServerResult<()> {
        if client.name.is_empty() {
            return Err(ServerError::Command {
                command: "client -i".to_string(),
                message: "Missing required field 'Client'.".to_string(),
            });
        }

        let mut record = client.clone();
        if record.root.is_none() {
            record.root = Some(format!("{}/{}", self.root_base, record.name));
        }
        if let Some(stream) = &record.stream {
            record.view = Self::stream_view(&record.name, stream);
        }

        match self.clients.entry(record.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(ServerError::ClientExists(record.name))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
                self.creates.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    async fn update_client(&self, client: &ClientWorkspace) -> ServerResult<()> {
        let mut entry = self
            .clients
            .get_mut(&client.name)
            .ok_or_else(|| ServerError::ClientNotFound(client.name.clone()))?;

        let mut record = client.clone();
        match &record.stream {
            Some(stream) => record.view = Self::stream_view(&record.name, stream),
            None => record.view = entry.view.clone(),
        }
        *entry = record;
        Ok(())
    }

    async fn get_streams(
        &self,
        paths: &[String],
        options: &GetStreamsOptions,
    ) -> ServerResult<Vec<StreamSummary>> {
        let streams = self.streams.read().await;
        let matched = streams
            .iter()
            .filter(|stream| {
                paths.is_empty()
                    || paths
                        .iter()
                        .any(|pattern| path_matches(pattern, stream.path()))
            })
            .map(|stream| stream.summary.clone());

        Ok(match options.max_results {
            Some(max) => matched.take(max).collect(),
            None => matched.collect(),
        })
    }

    async fn get_stream(&self, path: &str) -> ServerResult<Option<Stream>> {
        let streams = self.streams.read().await;
        Ok(streams.iter().find(|stream| stream.path() == path).cloned())
    }
}

/// Every session shares the same clients and streams.
#[async_trait]
impl Connector for InMemoryServer {
    async fn connect(&self) -> ServerResult<Arc<dyn P4Server>> {
        Ok(Arc::new(self.clone()))
    }
}
