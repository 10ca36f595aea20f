use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use std::{fs::File, io::BufReader, path::Path};
use thiserror::Error;

use crate::workspace::{validate_charset, WorkspaceSpec};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid charset: {0}")]
    InvalidCharset(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub workspace: WorkspaceSpec,
}

/// Connection settings for the `p4` command line client.
///
/// Unset fields fall back to the client's own environment (`P4PORT`,
/// `P4USER`, `P4CONFIG`, tickets).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_p4_bin")]
    pub p4_bin: String,

    #[serde(default)]
    pub port: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default, skip_serializing, deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,

    #[serde(default)]
    pub charset: Option<String>,
}

fn default_p4_bin() -> String {
    "p4".to_string()
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.map(|secret| SecretString::new(Box::from(secret))))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            p4_bin: default_p4_bin(),
            port: None,
            user: None,
            password: None,
            charset: None,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        validate_charset(self.workspace.charset())
            .map_err(|_| ConfigError::InvalidCharset(self.workspace.charset().to_string()))?;
        if let Some(charset) = &self.server.charset {
            validate_charset(charset).map_err(|_| ConfigError::InvalidCharset(charset.clone()))?;
        }
        Ok(())
    }

    /// Charset for the connection: the server setting, else the workspace's.
    pub fn effective_charset(&self) -> Option<String> {
        self.server
            .charset
            .clone()
            .or_else(|| Some(self.workspace.charset().to_string()))
            .filter(|charset| charset != "none")
    }
}
