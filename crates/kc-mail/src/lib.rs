//! SMTP adapter (lettre).
//!
//! Implements the kc-core mail port over an implicit-TLS SMTP submission
//! relay (e.g. smtp.gmail.com:465 with an app password).

use async_trait::async_trait;

use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use kc_core::{config::Config, errors::Error, ports::MailTransport, Result};

// Kindle's personal-document service recognizes EPUB under this type.
const EPUB_MIME: &str = "application/epub+zip";

const SUBJECT: &str = "Send to Kindle";
const BODY: &str = "Delivered by your Kindle courier 📚";

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let from: Mailbox = cfg
            .smtp_address
            .parse()
            .map_err(|e| Error::Config(format!("SMTP_ADDRESS is not a valid mailbox: {e}")))?;
        let to: Mailbox = cfg
            .kindle_email
            .parse()
            .map_err(|e| Error::Config(format!("KINDLE_EMAIL is not a valid mailbox: {e}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
            .map_err(|e| Error::Config(format!("invalid SMTP relay {}: {e}", cfg.smtp_host)))?
            .port(cfg.smtp_port)
            .credentials(Credentials::new(
                cfg.smtp_address.clone(),
                cfg.smtp_app_password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from,
            to,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send_attachment(&self, file_name: &str, bytes: Vec<u8>) -> Result<()> {
        let email = build_message(&self.from, &self.to, file_name, bytes)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| Error::Mail(format!("smtp send: {e}")))?;
        Ok(())
    }
}

fn build_message(from: &Mailbox, to: &Mailbox, file_name: &str, bytes: Vec<u8>) -> Result<Message> {
    let content_type =
        ContentType::parse(EPUB_MIME).map_err(|e| Error::Mail(format!("content type: {e}")))?;
    let attachment = Attachment::new(file_name.to_string()).body(bytes, content_type);

    Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(SUBJECT)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(BODY.to_string()))
                .singlepart(attachment),
        )
        .map_err(|e| Error::Mail(format!("build message: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailbox(s: &str) -> Mailbox {
        s.parse().unwrap()
    }

    #[test]
    fn message_carries_attachment_name_and_epub_type() {
        let email = build_message(
            &mailbox("sender@example.com"),
            &mailbox("reader@kindle.com"),
            "Some_Book.epub",
            b"fake epub".to_vec(),
        )
        .unwrap();

        let raw = String::from_utf8_lossy(&email.formatted()).to_string();
        assert!(raw.contains("Subject: Send to Kindle"));
        assert!(raw.contains("To: reader@kindle.com"));
        assert!(raw.contains("application/epub+zip"));
        assert!(raw.contains("Some_Book.epub"));
    }
}
