//! Telegram adapter (teloxide).
//!
//! Implements the kc-core messaging and file-fetch ports over the Telegram
//! Bot API.

use async_trait::async_trait;

use teloxide::{net::Download, prelude::*, types::ParseMode};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use kc_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    ports::{DocumentSource, MessagingPort},
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }
}

/// Downloads uploaded files into memory by their Telegram file id.
#[derive(Clone)]
pub struct TelegramFiles {
    bot: Bot,
}

impl TelegramFiles {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl DocumentSource for TelegramFiles {
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>> {
        let file = self
            .bot
            .get_file(file_id.to_string())
            .await
            .map_err(|e| Error::Download(format!("get_file: {e}")))?;

        let mut buf: Vec<u8> = Vec::new();
        self.bot
            .download_file(&file.path, &mut buf)
            .await
            .map_err(|e| Error::Download(format!("download: {e}")))?;
        Ok(buf)
    }
}
