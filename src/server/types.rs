use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A client workspace record as the server stores it.
///
/// Only `name`, `owner_name` and `stream` are managed by this crate. The
/// remaining fields are filled in by the server (root, view generated from
/// the stream, ...) and are carried through untouched on update. Form
/// fields without a member of their own land in `extra` (single values) or
/// `extra_lists` (indexed fields such as `AltRoots0..`, in index order).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientWorkspace {
    pub name: String,
    pub owner_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub view: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_lists: BTreeMap<String, Vec<String>>,
}

impl ClientWorkspace {
    /// Partial local record used to ask the server for a new client.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn set_owner_name(&mut self, owner: impl Into<String>) {
        self.owner_name = owner.into();
    }

    pub fn set_stream(&mut self, stream: impl Into<String>) {
        self.stream = Some(stream.into());
    }
}

/// Summary row returned by a stream listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub stream: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl StreamSummary {
    pub fn new(stream: impl Into<String>) -> Self {
        let stream = stream.into();
        let name = stream.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            stream,
            name,
            ..Default::default()
        }
    }
}

/// Full stream record for an exact path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    #[serde(flatten)]
    pub summary: StreamSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}

impl Stream {
    pub fn path(&self) -> &str {
        &self.summary.stream
    }
}

impl From<StreamSummary> for Stream {
    fn from(summary: StreamSummary) -> Self {
        Self {
            summary,
            ..Default::default()
        }
    }
}

/// Options for a stream listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetStreamsOptions {
    /// Server-side cap on returned rows (`-m`).
    pub max_results: Option<usize>,
    /// Filter expression passed through to the server (`-F`).
    pub filter: Option<String>,
}

impl GetStreamsOptions {
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}
