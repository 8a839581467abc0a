use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode};

use kc_core::relay::{self, IncomingDocument};

use crate::router::AppState;

pub async fn handle_document(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(doc) = msg.document() else {
        return Ok(());
    };

    let incoming = IncomingDocument {
        file_id: doc.file.id.clone(),
        file_name: doc.file_name.clone(),
        file_size: doc.file.size as u64,
    };

    let reply = relay::process_upload(
        &state.session,
        state.files.as_ref(),
        state.mailer.as_ref(),
        state.cfg.max_file_size,
        incoming,
    )
    .await;

    let _ = bot
        .send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .reply_to_message_id(msg.id)
        .await;

    Ok(())
}
