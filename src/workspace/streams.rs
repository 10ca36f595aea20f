//! Stream lookup for the stream-path field: suggestions while typing and
//! an existence check on the final value.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::validation::{ValidationError, ValidationResult};
use crate::server::{GetStreamsOptions, P4Server, ServerResult};

/// Upper bound on suggestions per lookup.
pub const SUGGEST_LIMIT: usize = 10;

/// Shortest prefix worth a server query.
const MIN_PREFIX_CHARS: usize = 2;

const DESCENDANTS: &str = "...";

/// Suggestion list handed back to the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoCompletionCandidates {
    pub values: Vec<String>,
}

impl AutoCompletionCandidates {
    pub fn add(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl From<Vec<String>> for AutoCompletionCandidates {
    fn from(values: Vec<String>) -> Self {
        Self { values }
    }
}

async fn lookup_streams(server: &dyn P4Server, prefix: &str) -> ServerResult<Vec<String>> {
    let paths = vec![format!("{}{}", prefix, DESCENDANTS)];
    let options = GetStreamsOptions::default().with_max_results(SUGGEST_LIMIT);
    let streams = server.get_streams(&paths, &options).await?;

    Ok(streams
        .into_iter()
        .take(SUGGEST_LIMIT)
        .map(|summary| summary.stream)
        .collect())
}

/// Stream paths under `prefix`, in server order, at most [`SUGGEST_LIMIT`].
///
/// Prefixes of one character or less return nothing without querying the
/// server. Lookup failures are logged and yield an empty list.
pub async fn suggest_streams(server: &dyn P4Server, prefix: &str) -> Vec<String> {
    if prefix.chars().count() < MIN_PREFIX_CHARS {
        return Vec::new();
    }

    match lookup_streams(server, prefix).await {
        Ok(streams) => {
            debug!("{} stream suggestions for {}", streams.len(), prefix);
            streams
        }
        Err(e) => {
            warn!("stream suggestion lookup for {} failed: {}", prefix, e);
            Vec::new()
        }
    }
}

/// Check that `path` names an existing stream.
pub async fn check_stream(server: &dyn P4Server, path: &str) -> ValidationResult {
    if path.is_empty() {
        return Err(ValidationError::MissingStream);
    }

    match server.get_stream(path).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(ValidationError::UnknownStream(path.to_string())),
        Err(e) => Err(ValidationError::Lookup(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{MockP4Server, ServerError, Stream, StreamSummary};
    use pretty_assertions::assert_eq;

    fn summaries(paths: &[&str]) -> Vec<StreamSummary> {
        paths.iter().map(|path| StreamSummary::new(*path)).collect()
    }

    #[tokio::test]
    async fn test_short_prefix_skips_server() {
        let mut server = MockP4Server::new();
        server.expect_get_streams().never();

        assert!(suggest_streams(&server, "").await.is_empty());
        assert!(suggest_streams(&server, "/").await.is_empty());
        assert!(suggest_streams(&server, "é").await.is_empty());
    }

    #[tokio::test]
    async fn test_suggest_queries_descendants_with_limit() {
        let mut server = MockP4Server::new();
        server
            .expect_get_streams()
            .withf(|paths, options| {
                paths.len() == 1
                    && paths[0] == "//depot/ma..."
                    && options.max_results == Some(SUGGEST_LIMIT)
            })
            .times(1)
            .returning(|_, _| Ok(summaries(&["//depot/main", "//depot/mainline"])));

        let streams = suggest_streams(&server, "//depot/ma").await;
        assert_eq!(streams, vec!["//depot/main", "//depot/mainline"]);
    }

    #[tokio::test]
    async fn test_suggest_truncates_oversized_answers() {
        let mut server = MockP4Server::new();
        server.expect_get_streams().returning(|_, _| {
            Ok((0..25)
                .map(|i| StreamSummary::new(format!("//depot/rel{:02}", i)))
                .collect())
        });

        let streams = suggest_streams(&server, "//depot/rel").await;
        assert_eq!(streams.len(), SUGGEST_LIMIT);
        assert_eq!(streams[0], "//depot/rel00");
        assert_eq!(streams[9], "//depot/rel09");
    }

    #[tokio::test]
    async fn test_suggest_swallows_failures() {
        let mut server = MockP4Server::new();
        server
            .expect_get_streams()
            .returning(|_, _| Err(ServerError::Connection("connect to server failed".to_string())));

        assert!(suggest_streams(&server, "//depot").await.is_empty());
    }

    #[tokio::test]
    async fn test_check_stream_known() {
        let mut server = MockP4Server::new();
        server
            .expect_get_stream()
            .withf(|path| path == "//depot/main")
            .returning(|path| Ok(Some(Stream::from(StreamSummary::new(path)))));

        assert_eq!(check_stream(&server, "//depot/main").await, Ok(()));
    }

    #[tokio::test]
    async fn test_check_stream_unknown() {
        let mut server = MockP4Server::new();
        server.expect_get_stream().returning(|_| Ok(None));

        let error = check_stream(&server, "//depot/main").await.unwrap_err();
        assert_eq!(error.to_string(), "Unknown Stream: //depot/main");
    }

    #[tokio::test]
    async fn test_check_stream_failure_keeps_message() {
        let mut server = MockP4Server::new();
        server.expect_get_stream().returning(|_| {
            Err(ServerError::Command {
                command: "-ztag streams //depot/main".to_string(),
                message: "Perforce password (P4PASSWD) invalid or unset.".to_string(),
            })
        });

        let error = check_stream(&server, "//depot/main").await.unwrap_err();
        assert_eq!(
            error,
            ValidationError::Lookup(
                "p4 -ztag streams //depot/main failed: Perforce password (P4PASSWD) invalid or unset."
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_check_empty_stream_skips_server() {
        let mut server = MockP4Server::new();
        server.expect_get_stream().never();

        assert_eq!(
            check_stream(&server, "").await,
            Err(ValidationError::MissingStream)
        );
    }
}
