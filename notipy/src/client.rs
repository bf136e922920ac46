use std::{
    io,
    path::{Component, Path, PathBuf},
    time::Instant,
};

use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{backend::BackendType, template, Error, Notifier, Result};

pub const API_VERSION: &str = "v1";

const TEMPLATE_EXTENSION: &str = "tmpl";

const SERVER_ADDRESS_VAR: &str = "NOTIPY_SERVER_ADDRESS";
const SERVER_PORT_VAR: &str = "NOTIPY_SERVER_PORT";
const TEMPLATE_DIR_VAR: &str = "NOTIPY_TEMPLATE_DIR";

/// Where the notipy server lives and where templates are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    server_address: String,
    server_port: u16,
    template_dir: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(server_address: impl Into<String>, server_port: u16) -> Self {
        Self {
            server_address: server_address.into(),
            server_port,
            template_dir: None,
        }
    }

    pub fn with_template_dir(mut self, template_dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(template_dir.into());
        self
    }

    /// Reads `NOTIPY_SERVER_ADDRESS`, `NOTIPY_SERVER_PORT` and the optional
    /// `NOTIPY_TEMPLATE_DIR` from the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| Error::InvalidConfig(format!("{key} must be set")))
        };

        let server_address = required(SERVER_ADDRESS_VAR)?;
        let server_port = required(SERVER_PORT_VAR)?
            .parse::<u16>()
            .map_err(|err| Error::InvalidConfig(format!("{SERVER_PORT_VAR}: {err}")))?;

        let mut config = Self::new(server_address, server_port);
        if let Some(dir) = lookup(TEMPLATE_DIR_VAR).filter(|value| !value.is_empty()) {
            config = config.with_template_dir(dir);
        }

        Ok(config)
    }

    pub fn server_address(&self) -> &str {
        &self.server_address
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn template_dir(&self) -> Option<&Path> {
        self.template_dir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

/// The JSON body of a send request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub backend: String,
    pub recipient: String,
    pub message: String,
}

impl NotificationPayload {
    pub fn new(
        backend: &BackendType,
        recipient: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            backend: backend.as_str().to_string(),
            recipient: recipient.into(),
            message: message.into(),
        }
    }
}

/// A notification handed to [`Notifier::notify`].
#[derive(Debug, Clone)]
pub struct Notification {
    pub backend: BackendType,
    pub recipient: String,
    pub body: MessageBody,
}

#[derive(Debug, Clone)]
pub enum MessageBody {
    Text(String),
    Template { name: String, variables: Value },
}

#[derive(Debug, Clone)]
pub struct NotipyClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl NotipyClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn send_url(&self) -> String {
        format!(
            "http://{}:{}/api/{}/notifications/send",
            self.config.server_address, self.config.server_port, API_VERSION
        )
    }

    /// Renders `<template_dir>/<template_name>.tmpl` with the given variables.
    ///
    /// `variables` must serialize to a JSON object (a map, a struct or
    /// `serde_json::json!({..})`), or to `null` for a template without
    /// placeholders. The name must be a single file name so templates are
    /// only ever read from inside the template directory.
    pub fn render_template<V>(&self, template_name: &str, variables: &V) -> Result<String>
    where
        V: Serialize + ?Sized,
    {
        let template_dir = self.config.template_dir().ok_or(Error::TemplateDirNotSet)?;

        if template_dir.exists() && !template_dir.is_dir() {
            return Err(Error::InvalidTemplateDir(template_dir.to_path_buf()));
        }

        if template_name.is_empty() {
            return Err(Error::TemplateNameNotSet);
        }

        if !is_plain_file_name(template_name) {
            return Err(Error::InvalidTemplateName(template_name.to_string()));
        }

        let template_file = template_dir.join(format!("{template_name}.{TEMPLATE_EXTENSION}"));
        debug!("[Notipy] Rendering template {}", template_file.display());

        let text = match std::fs::read_to_string(&template_file) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::TemplateNotFound(template_file))
            }
            Err(err) => return Err(err.into()),
        };

        template::render(&text, variables)
    }

    pub async fn send(&self, backend: &BackendType, recipient: &str, message: &str) -> Result<()> {
        let payload = NotificationPayload::new(backend, recipient, message);
        self.send_notification_request(&payload).await
    }

    /// Renders the template and sends the result like [`NotipyClient::send`].
    /// Rendering errors are returned as they are.
    pub async fn send_templated<V>(
        &self,
        backend: &BackendType,
        recipient: &str,
        template_name: &str,
        variables: &V,
    ) -> Result<()>
    where
        V: Serialize + Sync + ?Sized,
    {
        let message = self.render_template(template_name, variables)?;
        self.send(backend, recipient, &message).await
    }

    pub async fn send_notification_request(&self, payload: &NotificationPayload) -> Result<()> {
        let start = Instant::now();
        let url = self.send_url();
        let body = serde_json::to_string(payload)?;

        debug!(
            "[Notipy] Posting notification to {url} (backend: {}, recipient: {})",
            payload.backend, payload.recipient
        );

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        Self::parse_response(status, &text)?;

        info!(
            "[Notipy] Finished sending notification in {:?}",
            start.elapsed()
        );

        Ok(())
    }

    /// Checks a server response. Anything but `200 OK` is a
    /// [`Error::NotificationSend`] carrying the body's `"message"` field.
    /// The body must be JSON either way.
    pub fn parse_response(status: StatusCode, body: &str) -> Result<()> {
        let data = serde_json::from_str::<Value>(body)?;

        if status != StatusCode::OK {
            let message = data.get("message").and_then(|message| match message {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            });

            return Err(Error::NotificationSend { status, message });
        }

        Ok(())
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

#[async_trait::async_trait]
impl Notifier for NotipyClient {
    type Message = Notification;

    async fn init() -> Result<Box<Self>> {
        let config = ClientConfig::load()?;
        info!(
            "[Notipy] Using server {}:{}",
            config.server_address, config.server_port
        );

        Ok(Box::new(Self::new(config)))
    }

    async fn notify(&self, message: Self::Message) -> Result<()> {
        let Notification {
            backend,
            recipient,
            body,
        } = message;

        match body {
            MessageBody::Text(text) => self.send(&backend, &recipient, &text).await,
            MessageBody::Template { name, variables } => {
                self.send_templated(&backend, &recipient, &name, &variables)
                    .await
            }
        }
    }
}
