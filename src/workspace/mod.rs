//! Stream workspace configuration and binding.

pub mod binder;
pub mod descriptor;
pub mod expand;
pub mod spec;
pub mod streams;
pub mod validation;

#[cfg(test)]
mod tests;

pub use binder::{bind, BindError, BindResult};
pub use descriptor::{DescriptorRegistry, StreamWorkspaceDescriptor, WorkspaceDescriptor};
pub use expand::{NameExpander, VariableExpander};
pub use spec::{Charset, WorkspaceSpec, WorkspaceType, DEFAULT_FORMAT};
pub use streams::{check_stream, suggest_streams, AutoCompletionCandidates, SUGGEST_LIMIT};
pub use validation::{
    validate_charset, validate_format, FormValidation, FormValidationKind, ValidationError,
    ValidationResult,
};
