use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::expand::NameExpander;

/// Name template used when the configuration does not provide one.
pub const DEFAULT_FORMAT: &str = "jenkins-${NODE_NAME}-${JOB_NAME}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceType {
    Stream,
}

/// Character sets offered by the charset selector.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum Charset {
    #[strum(serialize = "none")]
    None,
    #[strum(serialize = "auto")]
    Auto,
    #[strum(serialize = "utf8")]
    Utf8,
    #[strum(serialize = "utf8-bom")]
    Utf8Bom,
    #[strum(serialize = "utf16")]
    Utf16,
    #[strum(serialize = "utf16le")]
    Utf16Le,
    #[strum(serialize = "utf16be")]
    Utf16Be,
    #[strum(serialize = "utf16-nobom")]
    Utf16NoBom,
    #[strum(serialize = "utf32")]
    Utf32,
    #[strum(serialize = "utf32-nobom")]
    Utf32NoBom,
    #[strum(serialize = "iso8859-1")]
    Iso8859_1,
    #[strum(serialize = "iso8859-5")]
    Iso8859_5,
    #[strum(serialize = "iso8859-7")]
    Iso8859_7,
    #[strum(serialize = "iso8859-15")]
    Iso8859_15,
    #[strum(serialize = "shiftjis")]
    ShiftJis,
    #[strum(serialize = "eucjp")]
    EucJp,
    #[strum(serialize = "winansi")]
    WinAnsi,
    #[strum(serialize = "cp850")]
    Cp850,
    #[strum(serialize = "cp858")]
    Cp858,
    #[strum(serialize = "cp936")]
    Cp936,
    #[strum(serialize = "cp949")]
    Cp949,
    #[strum(serialize = "cp950")]
    Cp950,
    #[strum(serialize = "cp1251")]
    Cp1251,
    #[strum(serialize = "cp1253")]
    Cp1253,
    #[strum(serialize = "koi8-r")]
    Koi8R,
    #[strum(serialize = "macosroman")]
    MacOsRoman,
}

/// Stream workspace configuration: which stream to bind and how to name
/// the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSpec {
    #[serde(default = "default_charset")]
    charset: String,
    #[serde(default)]
    stream_name: String,
    #[serde(default = "default_format")]
    format: String,
}

fn default_charset() -> String {
    Charset::None.to_string()
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

impl Default for WorkspaceSpec {
    fn default() -> Self {
        Self {
            charset: default_charset(),
            stream_name: String::new(),
            format: default_format(),
        }
    }
}

impl WorkspaceSpec {
    pub fn new(
        charset: impl Into<String>,
        stream_name: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            charset: charset.into(),
            stream_name: stream_name.into(),
            format: format.into(),
        }
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// The workspace's logical name is its unexpanded format.
    pub fn name(&self) -> &str {
        &self.format
    }

    pub fn workspace_type(&self) -> WorkspaceType {
        WorkspaceType::Stream
    }

    /// Client name for the current execution context.
    pub fn full_name(&self, expander: &dyn NameExpander) -> String {
        expander.expand(&self.format)
    }

    /// Copy with the fields that are `Some` replaced.
    pub fn with_overrides(
        &self,
        charset: Option<String>,
        stream_name: Option<String>,
        format: Option<String>,
    ) -> Self {
        Self {
            charset: charset.unwrap_or_else(|| self.charset.clone()),
            stream_name: stream_name.unwrap_or_else(|| self.stream_name.clone()),
            format: format.unwrap_or_else(|| self.format.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::expand::VariableExpander;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_defaults() {
        let spec = WorkspaceSpec::default();
        assert_eq!(spec.charset(), "none");
        assert_eq!(spec.format(), DEFAULT_FORMAT);
        assert_eq!(spec.name(), DEFAULT_FORMAT);
        assert_eq!(spec.workspace_type(), WorkspaceType::Stream);
        assert_eq!(spec.workspace_type().to_string(), "stream");
    }

    #[test]
    fn test_full_name_expands_format() {
        let spec = WorkspaceSpec::new("none", "//depot/main", DEFAULT_FORMAT);
        let expander = VariableExpander::default()
            .with_var("NODE_NAME", "agent1")
            .with_var("JOB_NAME", "myjob");
        assert_eq!(spec.full_name(&expander), "jenkins-agent1-myjob");
    }

    #[test]
    fn test_charset_names_round_trip() {
        for charset in Charset::iter() {
            let name: &'static str = charset.into();
            assert_eq!(Charset::from_str(name).unwrap(), charset);
        }
        assert!(Charset::from_str("klingon").is_err());
        assert_eq!(Charset::Iso8859_1.to_string(), "iso8859-1");
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let spec: WorkspaceSpec = serde_json::from_str(r#"{"stream_name": "//depot/main"}"#).unwrap();
        assert_eq!(spec.stream_name(), "//depot/main");
        assert_eq!(spec.format(), DEFAULT_FORMAT);
        assert_eq!(spec.charset(), "none");
    }

    #[test]
    fn test_with_overrides() {
        let spec = WorkspaceSpec::default().with_overrides(None, Some("//depot/dev".to_string()), None);
        assert_eq!(spec.stream_name(), "//depot/dev");
        assert_eq!(spec.format(), DEFAULT_FORMAT);
    }
}
