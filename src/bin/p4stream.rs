use clap::{Parser, Subcommand};
use p4stream::{
    config::AppConfig,
    server::CommandConnector,
    session::SessionManager,
    workspace::{bind, DescriptorRegistry, FormValidation, NameExpander, VariableExpander},
    Error, P4Result,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "p4stream.json")]
    config: PathBuf,

    /// Server address
    #[arg(long, env = "P4PORT")]
    port: Option<String>,

    /// User for the server connection
    #[arg(long = "p4-user", env = "P4USER")]
    p4_user: Option<String>,

    /// Connection charset
    #[arg(long, env = "P4CHARSET")]
    charset: Option<String>,

    /// Path to the p4 executable
    #[arg(long = "p4")]
    p4_bin: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a workspace name format
    CheckFormat { format: String },

    /// Suggest streams starting with a prefix
    Suggest { prefix: String },

    /// Check that a stream exists
    CheckStream { path: String },

    /// Create or update the client workspace for a stream
    Bind {
        /// Owner of the client
        #[arg(long)]
        user: String,

        /// Stream to bind (defaults to the configured stream)
        #[arg(long)]
        stream: Option<String>,

        /// Name format (defaults to the configured format)
        #[arg(long)]
        format: Option<String>,

        /// Extra name variable, KEY=VALUE; overrides the environment
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },
}

fn parse_var(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", value))
}

fn load_config(cli: &Cli) -> P4Result<AppConfig> {
    let mut config = AppConfig::load_or_default(&cli.config)?;
    if let Some(port) = &cli.port {
        config.server.port = Some(port.clone());
    }
    if let Some(user) = &cli.p4_user {
        config.server.user = Some(user.clone());
    }
    if let Some(charset) = &cli.charset {
        config.server.charset = Some(charset.clone());
    }
    if let Some(p4_bin) = &cli.p4_bin {
        config.server.p4_bin = p4_bin.clone();
    }
    config.server.charset = config.effective_charset();
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> P4Result<()> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|e| Error::internal(format!("Failed to serialize output: {}", e)))?;
    println!("{}", output);
    Ok(())
}

fn print_validation(json: bool, result: &FormValidation) -> P4Result<()> {
    if json {
        print_json(result)
    } else {
        println!("{}", result);
        Ok(())
    }
}

async fn run(cli: &Cli) -> P4Result<bool> {
    let config = load_config(cli)?;
    info!("config loaded.");
    debug!("config: {:?}", config);

    let registry = DescriptorRegistry::with_defaults();
    let descriptor = registry
        .get(config.workspace.workspace_type())
        .ok_or_else(|| Error::internal("no descriptor for stream workspaces"))?;

    if let Commands::CheckFormat { format } = &cli.command {
        let result = descriptor.check_format(format);
        print_validation(cli.json, &result)?;
        return Ok(result.is_ok());
    }

    let sessions = SessionManager::new(CommandConnector::new(config.server.clone()));
    let server = sessions.session().await?;

    let succeeded = match &cli.command {
        Commands::CheckFormat { .. } => true,
        Commands::Suggest { prefix } => {
            let candidates = descriptor.auto_complete_stream(server.as_ref(), prefix).await;
            if cli.json {
                print_json(&candidates)?;
            } else {
                for value in &candidates.values {
                    println!("{}", value);
                }
            }
            true
        }
        Commands::CheckStream { path } => {
            let result = descriptor.check_stream(server.as_ref(), path).await;
            print_validation(cli.json, &result)?;
            result.is_ok()
        }
        Commands::Bind {
            user,
            stream,
            format,
            vars,
        } => {
            let spec = config
                .workspace
                .with_overrides(None, stream.clone(), format.clone());
            let expander = VariableExpander::from_env().extend(vars.iter().cloned());
            debug!("binding {} as {}", expander.expand(spec.format()), user);

            let client = bind(server.as_ref(), &spec, user, &expander).await?;
            if cli.json {
                print_json(&client)?;
            } else {
                println!(
                    "Client {} bound to {} for {}",
                    client.name,
                    spec.stream_name(),
                    client.owner_name
                );
            }
            true
        }
    };

    sessions.shutdown().await;
    Ok(succeeded)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
