use std::{sync::Arc, time::Duration};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use kc_core::{
    config::Config,
    domain::ChatId,
    ports::{DocumentSource, MailTransport, MessagingPort},
    session::RelaySession,
    watchdog::IdleWatchdog,
};

use crate::handlers;
use crate::{TelegramFiles, TelegramMessenger};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub session: Arc<RelaySession>,
    pub messenger: Arc<dyn MessagingPort>,
    pub files: Arc<dyn DocumentSource>,
    pub mailer: Arc<dyn MailTransport>,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    session: Arc<RelaySession>,
    mailer: Arc<dyn MailTransport>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Basic startup info.
    if let Ok(me) = bot.get_me().await {
        println!("kindle courier started: @{}", me.username());
    }
    println!("Forwarding to: {}", cfg.kindle_email);

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let files: Arc<dyn DocumentSource> = Arc::new(TelegramFiles::new(bot.clone()));

    let owner = ChatId(cfg.allowed_user_id);
    let watchdog = IdleWatchdog::spawn(
        session.clone(),
        messenger.clone(),
        owner,
        cfg.watchdog_poll,
        cfg.idle_sleep,
    );

    // Best-effort online notice to the owner.
    {
        let messenger = messenger.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            let notice = "📚 Kindle courier online!\nUse /kindle when you want to send books.";
            if let Err(e) = messenger.send_html(owner, notice).await {
                tracing::warn!("startup notification failed: {e}");
            }
        });
    }

    let state = Arc::new(AppState {
        cfg,
        session,
        messenger,
        files,
        mailer,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    watchdog.stop().await;
    Ok(())
}
