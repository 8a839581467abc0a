use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    Result,
};

/// Send side of the chat transport.
///
/// Telegram is the first implementation; the shape is small enough that any
/// messenger with an HTML-ish text mode fits behind it.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;
}

/// Fetch side of the chat transport: raw bytes of an uploaded file by its
/// transport-assigned handle.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>>;
}

/// Mail transport: one message per call, the given bytes attached under
/// `file_name`. Synchronous from the caller's point of view, no retry.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send_attachment(&self, file_name: &str, bytes: Vec<u8>) -> Result<()>;
}
