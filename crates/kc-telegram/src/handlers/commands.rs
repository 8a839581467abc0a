use std::sync::Arc;

use teloxide::prelude::*;

use kc_core::{domain::ChatId, formatting::escape_html, relay};

use crate::router::AppState;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let (cmd, _arg) = parse_command(text);

    let reply = match cmd.as_str() {
        "start" | "help" => relay::greeting_reply(&state.session).await,
        "kindle" => relay::activate_reply(&state.session).await,
        "stop" => relay::deactivate_reply(&state.session).await,
        "status" => relay::status_reply(&state.session).await,
        _ => format!("Unknown command: /{}", escape_html(&cmd)),
    };

    let _ = state
        .messenger
        .send_html(ChatId(msg.chat.id.0), &reply)
        .await;
    Ok(())
}
