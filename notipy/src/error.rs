use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Broad category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The client was asked to do something its configuration does not allow.
    /// Always raised before any I/O.
    Configuration,
    /// A template file could not be found.
    NotFound,
    /// The server rejected the notification.
    Api,
    /// Filesystem, HTTP or JSON failure passed through from the layer below.
    Transport,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("template_dir must be set in order to use templating")]
    TemplateDirNotSet,

    #[error("template name must not be empty")]
    TemplateNameNotSet,

    #[error("template name must be a plain file name: '{0}'")]
    InvalidTemplateName(String),

    #[error("template_dir must be a directory: {}", .0.display())]
    InvalidTemplateDir(PathBuf),

    #[error("invalid template variables: {0}")]
    InvalidVariables(String),

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("{}", send_error_text(.status, .message))]
    NotificationSend {
        status: StatusCode,
        message: Option<String>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TemplateDirNotSet
            | Error::TemplateNameNotSet
            | Error::InvalidTemplateName(_)
            | Error::InvalidTemplateDir(_)
            | Error::InvalidVariables(_)
            | Error::InvalidConfig(_) => ErrorKind::Configuration,
            Error::TemplateNotFound(_) => ErrorKind::NotFound,
            Error::NotificationSend { .. } => ErrorKind::Api,
            Error::Io(_) | Error::Http(_) | Error::Json(_) => ErrorKind::Transport,
        }
    }
}

fn send_error_text(status: &StatusCode, message: &Option<String>) -> String {
    match message {
        Some(message) => format!("Notification could not be sent: '{message}'"),
        None => format!("Notification could not be sent (status {})", status.as_u16()),
    }
}
