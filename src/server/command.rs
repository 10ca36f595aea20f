//! Server implementation backed by the `p4` command line client.
//!
//! Reads use JSON tagged output (`p4 -Mj -ztag ...`) parsed by
//! [`super::ztag`]; client writes pipe a spec form into `p4 client -i`.
//! Connection settings (port, user, charset, password) come from
//! [`ServerConfig`] and are passed as global options, the password through
//! `P4PASSWD` so it never shows up in the process list.
//!
//! Values that end up on the command line are checked first: stream paths
//! must be depot paths and client names must not look like options.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::types::{ClientWorkspace, GetStreamsOptions, Stream, StreamSummary};
use super::ztag::{self, Record};
use super::{P4Server, ServerError, ServerResult};
use crate::config::ServerConfig;
use crate::session::Connector;

const NO_SUCH_STREAM: &str = "no such stream";
const DEPOT_PREFIX: &str = "//";
const OPTION_PREFIX: char = '-';

struct CommandOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

fn depot_path(path: &str) -> ServerResult<&str> {
    if path.starts_with(DEPOT_PREFIX) {
        Ok(path)
    } else {
        Err(ServerError::InvalidArgument(format!(
            "not a depot path: {}",
            path
        )))
    }
}

fn client_name(name: &str) -> ServerResult<&str> {
    if name.is_empty() || name.starts_with(OPTION_PREFIX) {
        Err(ServerError::InvalidArgument(format!(
            "invalid client name: '{}'",
            name
        )))
    } else {
        Ok(name)
    }
}

#[derive(Debug, Clone)]
pub struct CommandServer {
    config: ServerConfig,
}

impl CommandServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    fn global_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(port) = &self.config.port {
            args.push("-p".to_string());
            args.push(port.clone());
        }
        if let Some(user) = &self.config.user {
            args.push("-u".to_string());
            args.push(user.clone());
        }
        if let Some(charset) = self.config.charset.as_deref().filter(|c| *c != "none") {
            args.push("-C".to_string());
            args.push(charset.to_string());
        }
        args
    }

    async fn exec(&self, args: &[&str], input: Option<&str>) -> ServerResult<CommandOutput> {
        let command_line = args.join(" ");
        debug!("p4 {}", command_line);

        let mut command = Command::new(&self.config.p4_bin);
        command
            .args(self.global_args())
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(password) = &self.config.password {
            command.env("P4PASSWD", password.expose_secret());
        }

        let mut child = command.spawn().map_err(|e| {
            ServerError::Connection(format!("failed to start {}: {}", self.config.p4_bin, e))
        })?;

        if let Some(input) = input {
            if let Some(mut stdin) = child.stdin.take() {
                match stdin.write_all(input.as_bytes()).await {
                    Ok(()) => {}
                    // p4 gave up before reading; its exit status and stderr say why.
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                        debug!("p4 {} closed stdin early", command_line);
                    }
                    Err(e) => return Err(ServerError::Connection(e.to_string())),
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ServerError::Connection(e.to_string()))?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    async fn run(&self, args: &[&str], input: Option<&str>) -> ServerResult<String> {
        let output = self.exec(args, input).await?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(ServerError::Command {
                command: args.join(" "),
                message: output.stderr,
            })
        }
    }

    async fn tagged(&self, args: &[&str]) -> ServerResult<Vec<Record>> {
        let mut tagged_args = vec!["-Mj", "-ztag"];
        tagged_args.extend_from_slice(args);
        let output = self.exec(&tagged_args, None).await?;
        let command = tagged_args.join(" ");

        let parsed = match ztag::parse_output(&output.stdout) {
            Ok(parsed) => parsed,
            Err(_) if !output.success => {
                return Err(ServerError::Command {
                    command,
                    message: output.stderr,
                })
            }
            Err(e) => return Err(e),
        };
        for warning in &parsed.warnings {
            debug!("p4 {}: {}", command, warning);
        }

        if !parsed.errors.is_empty() {
            return Err(ServerError::Command {
                command,
                message: parsed.errors.join("\n"),
            });
        }
        if !output.success {
            return Err(ServerError::Command {
                command,
                message: output.stderr,
            });
        }
        Ok(parsed.records)
    }

    async fn client_exists(&self, name: &str) -> ServerResult<bool> {
        let records = self.tagged(&["clients", "-e", client_name(name)?]).await?;
        Ok(records.iter().any(|record| {
            record
                .get("client")
                .or_else(|| record.get("Client"))
                .is_some_and(|client| client == name)
        }))
    }

    async fn client_template(&self, name: &str) -> ServerResult<ClientWorkspace> {
        let records = self.tagged(&["client", "-o", client_name(name)?]).await?;
        let record = records
            .first()
            .ok_or_else(|| ServerError::Protocol(format!("empty client spec for {}", name)))?;
        ztag::client_from_record(record)
    }

    async fn submit_client(&self, client: &ClientWorkspace) -> ServerResult<()> {
        let form = ztag::render_client_form(client);
        self.run(&["client", "-i"], Some(&form)).await?;
        Ok(())
    }
}

/// Overlay the fields a caller set on top of the server template.
fn merge_into_template(template: ClientWorkspace, client: &ClientWorkspace) -> ClientWorkspace {
    let mut extra = template.extra;
    extra.extend(client.extra.clone());
    let mut extra_lists = template.extra_lists;
    extra_lists.extend(client.extra_lists.clone());

    ClientWorkspace {
        name: client.name.clone(),
        owner_name: if client.owner_name.is_empty() {
            template.owner_name
        } else {
            client.owner_name.clone()
        },
        stream: client.stream.clone().or(template.stream),
        root: client.root.clone().or(template.root),
        host: client.host.clone().or(template.host),
        description: client.description.clone().or(template.description),
        options: client.options.clone().or(template.options),
        view: if client.view.is_empty() {
            template.view
        } else {
            client.view.clone()
        },
        extra,
        extra_lists,
    }
}

#[async_trait]
impl P4Server for CommandServer {
    async fn get_client(&self, name: &str) -> ServerResult<Option<ClientWorkspace>> {
        if !self.client_exists(name).await? {
            return Ok(None);
        }
        self.client_template(name).await.map(Some)
    }

    async fn create_client(&self, client: &ClientWorkspace) -> ServerResult<()> {
        if self.client_exists(&client.name).await? {
            return Err(ServerError::ClientExists(client.name.clone()));
        }
        let template = self.client_template(&client.name).await?;
        self.submit_client(&merge_into_template(template, client))
            .await
    }

    async fn update_client(&self, client: &ClientWorkspace) -> ServerResult<()> {
        if !self.client_exists(&client.name).await? {
            return Err(ServerError::ClientNotFound(client.name.clone()));
        }
        self.submit_client(client).await
    }

    async fn get_streams(
        &self,
        paths: &[String],
        options: &GetStreamsOptions,
    ) -> ServerResult<Vec<StreamSummary>> {
        let max = options.max_results.map(|max| max.to_string());
        let mut args = vec!["streams"];
        if let Some(max) = &max {
            args.push("-m");
            args.push(max.as_str());
        }
        if let Some(filter) = &options.filter {
            args.push("-F");
            args.push(filter.as_str());
        }
        for path in paths {
            args.push(depot_path(path)?);
        }

        let records = self.tagged(&args).await?;
        records
            .iter()
            .map(ztag::stream_summary_from_record)
            .collect()
    }

    async fn get_stream(&self, path: &str) -> ServerResult<Option<Stream>> {
        if depot_path(path).is_err() {
            debug!("{} is not a depot path, no stream to look up", path);
            return Ok(None);
        }

        let records = match self.tagged(&["streams", path]).await {
            Ok(records) => records,
            Err(ServerError::Command { message, .. }) if message.contains(NO_SUCH_STREAM) => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };

        records
            .iter()
            .find(|record| record.get("Stream").is_some_and(|stream| stream == path))
            .map(ztag::stream_from_record)
            .transpose()
    }
}

/// Connects by checking that the server answers `p4 info`.
#[derive(Debug, Clone)]
pub struct CommandConnector {
    config: ServerConfig,
}

impl CommandConnector {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for CommandConnector {
    async fn connect(&self) -> ServerResult<Arc<dyn P4Server>> {
        let server = CommandServer::new(self.config.clone());
        let info = server
            .tagged(&["info"])
            .await
            .map_err(|e| ServerError::Connection(e.to_string()))?;

        if let Some(address) = info.first().and_then(|record| record.get("serverAddress")) {
            debug!("connected to {}", address);
        }
        Ok(Arc::new(server))
    }
}
