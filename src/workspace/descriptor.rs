//! UI capability for configuring a workspace.
//!
//! A [`WorkspaceDescriptor`] bundles what a configuration form needs: a
//! display name, default values, the charset choices, and the field
//! callbacks. Descriptors are registered explicitly with a
//! [`DescriptorRegistry`]; the form layer looks them up by
//! [`WorkspaceType`] instead of discovering callbacks by name.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use strum::IntoEnumIterator;

use super::spec::{Charset, WorkspaceType, DEFAULT_FORMAT};
use super::streams::{check_stream, suggest_streams, AutoCompletionCandidates};
use super::validation::{validate_format, FormValidation};
use crate::server::P4Server;

#[async_trait]
pub trait WorkspaceDescriptor: Send + Sync {
    fn display_name(&self) -> &str;

    fn workspace_type(&self) -> WorkspaceType;

    fn default_format(&self) -> &str;

    /// Choices for the charset selector.
    fn charsets(&self) -> Vec<&'static str> {
        Charset::iter().map(Into::into).collect()
    }

    fn check_format(&self, value: &str) -> FormValidation;

    async fn auto_complete_stream(
        &self,
        server: &dyn P4Server,
        value: &str,
    ) -> AutoCompletionCandidates;

    async fn check_stream(&self, server: &dyn P4Server, value: &str) -> FormValidation;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StreamWorkspaceDescriptor;

#[async_trait]
impl WorkspaceDescriptor for StreamWorkspaceDescriptor {
    fn display_name(&self) -> &str {
        "Streams (view generated by Perforce for each node)"
    }

    fn workspace_type(&self) -> WorkspaceType {
        WorkspaceType::Stream
    }

    fn default_format(&self) -> &str {
        DEFAULT_FORMAT
    }

    fn check_format(&self, value: &str) -> FormValidation {
        validate_format(value).into()
    }

    async fn auto_complete_stream(
        &self,
        server: &dyn P4Server,
        value: &str,
    ) -> AutoCompletionCandidates {
        suggest_streams(server, value).await.into()
    }

    async fn check_stream(&self, server: &dyn P4Server, value: &str) -> FormValidation {
        check_stream(server, value).await.into()
    }
}

#[derive(Clone, Default)]
pub struct DescriptorRegistry {
    descriptors: HashMap<WorkspaceType, Arc<dyn WorkspaceDescriptor>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the stock descriptors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(StreamWorkspaceDescriptor));
        registry
    }

    /// Register a descriptor, replacing any previous one for the same type.
    pub fn register(&mut self, descriptor: Arc<dyn WorkspaceDescriptor>) {
        self.descriptors
            .insert(descriptor.workspace_type(), descriptor);
    }

    pub fn get(&self, workspace_type: WorkspaceType) -> Option<Arc<dyn WorkspaceDescriptor>> {
        self.descriptors.get(&workspace_type).cloned()
    }

    pub fn types(&self) -> Vec<WorkspaceType> {
        self.descriptors.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::InMemoryServer;
    use crate::workspace::validation::FormValidationKind;

    #[test]
    fn test_registry_defaults() {
        let registry = DescriptorRegistry::with_defaults();
        let descriptor = registry.get(WorkspaceType::Stream).unwrap();
        assert_eq!(
            descriptor.display_name(),
            "Streams (view generated by Perforce for each node)"
        );
        assert_eq!(descriptor.default_format(), "jenkins-${NODE_NAME}-${JOB_NAME}");
        assert_eq!(registry.types(), vec![WorkspaceType::Stream]);
    }

    #[test]
    fn test_empty_registry() {
        assert!(DescriptorRegistry::new().get(WorkspaceType::Stream).is_none());
    }

    #[test]
    fn test_charset_choices() {
        let charsets = StreamWorkspaceDescriptor.charsets();
        assert_eq!(charsets.first(), Some(&"none"));
        assert!(charsets.contains(&"utf8"));
        assert!(charsets.contains(&"shiftjis"));
    }

    #[test]
    fn test_check_format_messages() {
        let descriptor = StreamWorkspaceDescriptor;
        assert!(descriptor.check_format("${NODE_NAME}").is_ok());

        let result = descriptor.check_format("");
        assert_eq!(result.kind, FormValidationKind::Error);
        assert_eq!(
            result.message.as_deref(),
            Some("Workspace Name format is mandatory.")
        );

        let result = descriptor.check_format("static-name");
        assert_eq!(result.message.as_deref(), Some("Workspace Name format error."));
    }

    #[tokio::test]
    async fn test_stream_callbacks_against_server() {
        let server = InMemoryServer::default().with_streams(["//depot/main", "//depot/mainline"]);
        let descriptor = StreamWorkspaceDescriptor;

        let candidates = descriptor.auto_complete_stream(&server, "//depot/ma").await;
        assert_eq!(candidates.values, vec!["//depot/main", "//depot/mainline"]);

        assert!(descriptor.check_stream(&server, "//depot/main").await.is_ok());
        let result = descriptor.check_stream(&server, "//depot/dev").await;
        assert_eq!(result.message.as_deref(), Some("Unknown Stream: //depot/dev"));
    }
}
