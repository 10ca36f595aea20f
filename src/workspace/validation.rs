//! Form validation results.
//!
//! Validators return `Result<(), ValidationError>`; the UI layer converts
//! that into a [`FormValidation`] for display.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use super::spec::Charset;

const PLACEHOLDER_OPEN: &str = "${";
const PLACEHOLDER_CLOSE: &str = "}";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Workspace Name format is mandatory.")]
    MissingFormat,

    #[error("Workspace Name format error.")]
    MalformedFormat,

    #[error("Stream name is mandatory.")]
    MissingStream,

    #[error("Unknown Stream: {0}")]
    UnknownStream(String),

    /// Lookup failure; the message is the underlying error text, verbatim.
    #[error("{0}")]
    Lookup(String),

    #[error("Unknown charset: {0}")]
    UnknownCharset(String),
}

pub type ValidationResult = Result<(), ValidationError>;

/// Check that a name format contains a placeholder.
///
/// Deliberately loose: the format only has to contain `${` somewhere and `}`
/// somewhere. It catches a literal name typed in place of a template and
/// nothing more.
pub fn validate_format(format: &str) -> ValidationResult {
    if format.is_empty() {
        return Err(ValidationError::MissingFormat);
    }
    if format.contains(PLACEHOLDER_OPEN) && format.contains(PLACEHOLDER_CLOSE) {
        Ok(())
    } else {
        Err(ValidationError::MalformedFormat)
    }
}

pub fn validate_charset(charset: &str) -> ValidationResult {
    Charset::from_str(charset)
        .map(|_| ())
        .map_err(|_| ValidationError::UnknownCharset(charset.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormValidationKind {
    Ok,
    Error,
}

/// Display form of a validation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormValidation {
    pub kind: FormValidationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FormValidation {
    pub fn ok() -> Self {
        Self {
            kind: FormValidationKind::Ok,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FormValidationKind::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.kind == FormValidationKind::Ok
    }
}

impl From<ValidationResult> for FormValidation {
    fn from(result: ValidationResult) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

impl std::fmt::Display for FormValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.message) {
            (FormValidationKind::Ok, _) => write!(f, "OK"),
            (FormValidationKind::Error, Some(message)) => write!(f, "ERROR: {}", message),
            (FormValidationKind::Error, None) => write!(f, "ERROR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_format_is_mandatory() {
        assert_eq!(validate_format(""), Err(ValidationError::MissingFormat));
        assert_eq!(
            ValidationError::MissingFormat.to_string(),
            "Workspace Name format is mandatory."
        );
    }

    #[test]
    fn test_format_needs_both_markers() {
        assert!(validate_format("jenkins-${NODE_NAME}-${JOB_NAME}").is_ok());
        assert_eq!(
            validate_format("jenkins-static"),
            Err(ValidationError::MalformedFormat)
        );
        assert_eq!(
            validate_format("jenkins-${NODE_NAME"),
            Err(ValidationError::MalformedFormat)
        );
        assert_eq!(validate_format("jenkins-}"), Err(ValidationError::MalformedFormat));
    }

    #[test]
    fn test_marker_order_is_not_checked() {
        assert!(validate_format("}${").is_ok());
        assert!(validate_format("${}").is_ok());
    }

    #[test]
    fn test_validate_charset() {
        assert!(validate_charset("utf8").is_ok());
        assert_eq!(
            validate_charset("latin-2"),
            Err(ValidationError::UnknownCharset("latin-2".to_string()))
        );
    }

    #[test]
    fn test_form_validation_from_result() {
        let ok: FormValidation = validate_format("${X}").into();
        assert!(ok.is_ok());
        assert_eq!(ok.to_string(), "OK");

        let error: FormValidation =
            Err::<(), _>(ValidationError::UnknownStream("//depot/main".to_string())).into();
        assert!(!error.is_ok());
        assert_eq!(error.message.as_deref(), Some("Unknown Stream: //depot/main"));
        assert_eq!(error.to_string(), "ERROR: Unknown Stream: //depot/main");
    }

    #[test]
    fn test_form_validation_json() {
        let json = serde_json::to_value(FormValidation::error("Workspace Name format error.")).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["message"], "Workspace Name format error.");

        let json = serde_json::to_value(FormValidation::ok()).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "ok"}));
    }
}
