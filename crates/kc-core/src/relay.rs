//! Command and upload logic, independent of the chat framework.
//!
//! Each handler takes the shared session (plus the ports it needs) and
//! returns the reply text; the Telegram adapter only parses updates, calls
//! in here, and sends the result. That keeps every branch testable with
//! fake ports.

use tracing::warn;

use crate::{
    domain::UserId,
    formatting::{escape_html, format_duration, format_summary, has_epub_extension, prettify_title},
    ports::{DocumentSource, MailTransport},
    session::RelaySession,
};

/// Fixed reply for any sender that is not the configured owner.
pub const DENIED_REPLY: &str = "🚫 This bot is private.";

const FALLBACK_FILE_NAME: &str = "book.epub";

/// An uploaded document as seen by the chat transport.
#[derive(Clone, Debug)]
pub struct IncomingDocument {
    pub file_id: String,
    pub file_name: Option<String>,
    pub file_size: u64,
}

/// The single-owner check. Messages without a sender are never authorized.
pub fn is_authorized(user_id: Option<UserId>, allowed_user_id: i64) -> bool {
    user_id.map(|u| u.0 == allowed_user_id).unwrap_or(false)
}

/// `/start`: introduce the bot and name the activation command.
pub async fn greeting_reply(session: &RelaySession) -> String {
    session.touch().await;
    "Hi 🫶🏻 I'm your <b>Kindle courier</b> 📚\n\
     Send me EPUBs and I'll forward them straight to your Kindle.\n\n\
     When you want to start, use /kindle."
        .to_string()
}

/// `/kindle`: open a fresh session (re-issuing it restarts the counters).
pub async fn activate_reply(session: &RelaySession) -> String {
    session.touch().await;
    session.activate().await;
    "Kindle mode is on ✅\nNow send me your EPUBs (as many as you like).".to_string()
}

/// `/stop`: close the session and report it, or note there was none.
pub async fn deactivate_reply(session: &RelaySession) -> String {
    session.touch().await;
    match session.deactivate().await {
        None => "I was already resting 🫶🏻".to_string(),
        Some(summary) => format!(
            "Kindle mode is off 🫶🏻\n\n{}\n\nSee you soon 📚✨",
            format_summary(&summary)
        ),
    }
}

/// `/status`: read-only view of the current session.
pub async fn status_reply(session: &RelaySession) -> String {
    session.touch().await;
    let st = session.stats().await;

    let mut lines = vec!["📊 <b>Courier status</b>\n".to_string()];
    if st.active {
        lines.push("✅ Kindle mode: on".to_string());
        lines.push(format!("📥 Received: {}", st.received));
        lines.push(format!("✅ Delivered: {}", st.delivered));
        lines.push(format!("❌ Failed: {}", st.failed));
        lines.push(format!(
            "💤 Idle for: {}",
            format_duration(st.idle_for.as_secs() as i64)
        ));
    } else {
        lines.push("⚪ Kindle mode: off — use /kindle to start".to_string());
    }
    lines.join("\n")
}

/// The upload pipeline: preconditions, fetch, mail, bookkeeping.
///
/// Transport calls happen with no session lock held; only the resulting
/// counter updates re-enter it. A failed upload never affects the session
/// itself or other uploads.
pub async fn process_upload(
    session: &RelaySession,
    source: &dyn DocumentSource,
    mailer: &dyn MailTransport,
    max_file_size: u64,
    doc: IncomingDocument,
) -> String {
    session.touch().await;

    if !session.is_active().await {
        return "Use /kindle first and I'll start forwarding 📚".to_string();
    }

    if doc.file_size > max_file_size {
        return format!(
            "❌ File too large. Maximum size is {}MB.",
            max_file_size / (1024 * 1024)
        );
    }

    let file_name = doc
        .file_name
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
    if !has_epub_extension(&file_name) {
        return "That file is not an EPUB 😅\nSend me a <b>.epub</b> and I'll handle the rest."
            .to_string();
    }

    session.record_received().await;

    let bytes = match source.fetch(&doc.file_id).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("download of {file_name} failed: {e}");
            session
                .record_failure(format!("{file_name}: download failed ({e})"))
                .await;
            return format!("❌ Could not download <b>{}</b>.", escape_html(&file_name));
        }
    };

    if let Err(e) = mailer.send_attachment(&file_name, bytes).await {
        warn!("mail delivery of {file_name} failed: {e}");
        session
            .record_failure(format!("{file_name}: email send failed ({e})"))
            .await;
        return format!(
            "❌ Could not send <b>{}</b> to your Kindle.",
            escape_html(&file_name)
        );
    }

    session.record_delivered().await;
    format!(
        "✅ <b>{}</b> is on its way to your Kindle 🫶🏻",
        escape_html(&prettify_title(&file_name))
    )
}
