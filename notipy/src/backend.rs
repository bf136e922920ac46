use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};

use crate::Error;

/// Channel the server uses to deliver a notification.
///
/// The wire value (`as_str`) is what goes into the request payload, not the
/// variant name. Backends the client doesn't know about can still be
/// addressed through [`BackendType::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackendType {
    Telegram,
    TelegramGroup,
    Custom(String),
}

impl BackendType {
    pub fn as_str(&self) -> &str {
        match self {
            BackendType::Telegram => "telegram",
            BackendType::TelegramGroup => "telegram_group",
            BackendType::Custom(value) => value,
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.is_empty() {
            return Err(Error::InvalidConfig(String::from(
                "backend must not be empty",
            )));
        }

        let backend = match value.to_ascii_lowercase().as_str() {
            "telegram" => BackendType::Telegram,
            "telegram_group" => BackendType::TelegramGroup,
            _ => BackendType::Custom(value.to_string()),
        };

        Ok(backend)
    }
}

impl Serialize for BackendType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
