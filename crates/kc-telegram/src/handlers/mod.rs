//! Telegram update handlers.
//!
//! Each handler authorizes the sender, then delegates to `kc_core::relay`
//! and sends the reply it returns.

use std::sync::Arc;

use teloxide::prelude::*;

use kc_core::{domain::UserId, relay};

use crate::router::AppState;

mod commands;
mod document;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let user_id = msg.from().map(|u| UserId(u.id.0 as i64));

    if !relay::is_authorized(user_id, state.cfg.allowed_user_id) {
        let _ = bot.send_message(msg.chat.id, relay::DENIED_REPLY).await;
        return Ok(());
    }

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(msg, state).await;
        }
    }

    if msg.document().is_some() {
        return document::handle_document(bot, msg, state).await;
    }

    // Anything else (plain text, photos, stickers) is quietly ignored.
    Ok(())
}
