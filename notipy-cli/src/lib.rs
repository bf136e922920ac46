use std::{collections::HashMap, time::Instant};

use anyhow::{anyhow, Context};
use clap::{ArgAction, Args, Parser, Subcommand};
use notipy::{BackendType, ClientConfig, NotipyClient};
use serde::Serialize;
use tracing::{debug, info, Level};
use tracing_subscriber::filter::Targets;

#[derive(Debug, Parser)]
#[command(name = "notipy", version, about = "Send notifications through a notipy server")]
pub struct Cli {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct ServerArgs {
    #[arg(long, env = "NOTIPY_SERVER_ADDRESS", global = true)]
    pub server_address: Option<String>,

    #[arg(long, env = "NOTIPY_SERVER_PORT", global = true)]
    pub server_port: Option<u16>,

    /// Directory holding `<name>.tmpl` files
    #[arg(long, env = "NOTIPY_TEMPLATE_DIR", global = true)]
    pub template_dir: Option<String>,
}

impl ServerArgs {
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let address = self
            .server_address
            .clone()
            .ok_or_else(|| anyhow!("--server-address or NOTIPY_SERVER_ADDRESS must be set"))?;
        let port = self
            .server_port
            .ok_or_else(|| anyhow!("--server-port or NOTIPY_SERVER_PORT must be set"))?;

        Ok(self.with_template_dir(ClientConfig::new(address, port)))
    }

    // Rendering never touches the network, so the server may be left unset.
    fn render_config(&self) -> ClientConfig {
        let config = ClientConfig::new(
            self.server_address.clone().unwrap_or_default(),
            self.server_port.unwrap_or_default(),
        );
        self.with_template_dir(config)
    }

    fn with_template_dir(&self, config: ClientConfig) -> ClientConfig {
        match &self.template_dir {
            Some(dir) => config.with_template_dir(dir),
            None => config,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a plain message
    Send {
        backend: BackendType,
        recipient: String,
        message: String,
    },
    /// Render a template and send the result
    SendTemplated {
        backend: BackendType,
        recipient: String,
        template: String,
        /// Template variable as key=value, may be repeated
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },
    /// Print a rendered template without sending it
    Render {
        template: String,
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },
}

#[derive(Debug, Serialize)]
pub struct Response {
    backend: String,
    recipient: String,
    templated: bool,
    elapsed_ms: u128,
}

#[derive(Debug)]
pub enum Outcome {
    Sent(Response),
    Rendered(String),
}

/// Verbosity only applies to our own crates; dependencies stay at warn.
pub fn log_targets(verbose: u8) -> Targets {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    Targets::new()
        .with_default(Level::WARN)
        .with_target("notipy", level)
        .with_target("notipy_cli", level)
}

pub fn parse_var(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;

    if key.is_empty() {
        return Err(format!("empty variable name in '{s}'"));
    }

    Ok((key.to_string(), value.to_string()))
}

pub async fn run(cli: Cli) -> anyhow::Result<Outcome> {
    let start = Instant::now();

    match cli.command {
        Command::Send {
            backend,
            recipient,
            message,
        } => {
            let client = NotipyClient::new(cli.server.client_config()?);
            debug!("Sending message via {backend} to {recipient}");

            client
                .send(&backend, &recipient, &message)
                .await
                .with_context(|| format!("Failed to notify {recipient} via {backend}"))?;

            info!("Notification sent in {:?}", start.elapsed());
            Ok(Outcome::Sent(Response {
                backend: backend.to_string(),
                recipient,
                templated: false,
                elapsed_ms: start.elapsed().as_millis(),
            }))
        }
        Command::SendTemplated {
            backend,
            recipient,
            template,
            vars,
        } => {
            let client = NotipyClient::new(cli.server.client_config()?);
            let vars = vars.into_iter().collect::<HashMap<_, _>>();
            debug!("Sending template {template} via {backend} to {recipient}");

            client
                .send_templated(&backend, &recipient, &template, &vars)
                .await
                .with_context(|| {
                    format!("Failed to notify {recipient} via {backend} using template {template}")
                })?;

            info!("Templated notification sent in {:?}", start.elapsed());
            Ok(Outcome::Sent(Response {
                backend: backend.to_string(),
                recipient,
                templated: true,
                elapsed_ms: start.elapsed().as_millis(),
            }))
        }
        Command::Render { template, vars } => {
            let client = NotipyClient::new(cli.server.render_config());
            let vars = vars.into_iter().collect::<HashMap<_, _>>();

            let rendered = client
                .render_template(&template, &vars)
                .with_context(|| format!("Failed to render template {template}"))?;

            Ok(Outcome::Rendered(rendered))
        }
    }
}
