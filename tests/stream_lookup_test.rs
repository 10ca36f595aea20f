use p4stream::server::{InMemoryServer, MockP4Server, ServerError};
use p4stream::workspace::{
    check_stream, suggest_streams, DescriptorRegistry, FormValidationKind, ValidationError,
    WorkspaceType, SUGGEST_LIMIT,
};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_unknown_stream_message() {
    let server = InMemoryServer::default().with_streams(["//depot/mainline"]);

    let result = check_stream(&server, "//depot/main").await;
    assert_eq!(
        result,
        Err(ValidationError::UnknownStream("//depot/main".to_string()))
    );
    assert_eq!(
        result.unwrap_err().to_string(),
        "Unknown Stream: //depot/main"
    );
}

#[tokio::test]
async fn test_suggest_returns_server_order() {
    let server = InMemoryServer::default().with_streams([
        "//depot/mainline",
        "//depot/dev",
        "//depot/main",
    ]);

    let streams = suggest_streams(&server, "//depot/ma").await;
    assert_eq!(streams, vec!["//depot/mainline", "//depot/main"]);
}

#[tokio::test]
async fn test_suggest_truncates_to_limit() {
    let paths: Vec<String> = (0..15).map(|i| format!("//depot/main-{:02}", i)).collect();
    let server = InMemoryServer::default().with_streams(paths.clone());

    let streams = suggest_streams(&server, "//depot/ma").await;
    assert_eq!(streams.len(), SUGGEST_LIMIT);
    assert_eq!(streams, paths[..SUGGEST_LIMIT].to_vec());
}

#[tokio::test]
async fn test_suggest_short_prefix_does_not_query() {
    let mut server = MockP4Server::new();
    server.expect_get_streams().never();

    assert!(suggest_streams(&server, "/").await.is_empty());
}

#[tokio::test]
async fn test_descriptor_surfaces_lookup_failure_verbatim() {
    let mut server = MockP4Server::new();
    server
        .expect_get_stream()
        .returning(|_| Err(ServerError::Connection("connect to server failed; check $P4PORT.".to_string())));
    server
        .expect_get_streams()
        .returning(|_, _| Err(ServerError::Connection("connect to server failed; check $P4PORT.".to_string())));

    let registry = DescriptorRegistry::with_defaults();
    let descriptor = registry.get(WorkspaceType::Stream).unwrap();

    let validation = descriptor.check_stream(&server, "//depot/main").await;
    assert_eq!(validation.kind, FormValidationKind::Error);
    assert_eq!(
        validation.message.as_deref(),
        Some("Connection error: connect to server failed; check $P4PORT.")
    );

    let candidates = descriptor.auto_complete_stream(&server, "//depot/ma").await;
    assert!(candidates.is_empty());
}
