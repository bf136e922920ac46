#![warn(clippy::all)]

pub mod backend;
pub mod client;
pub mod error;
pub mod template;

pub use backend::BackendType;
pub use client::{ClientConfig, MessageBody, Notification, NotificationPayload, NotipyClient};
pub use error::{Error, ErrorKind, Result};

#[async_trait::async_trait]
pub trait Notifier {
    type Message;

    async fn init() -> Result<Box<Self>>;
    async fn notify(&self, message: Self::Message) -> Result<()>;
}
