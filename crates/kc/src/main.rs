use std::sync::Arc;

use kc_core::{config::Config, session::RelaySession};
use kc_mail::SmtpMailer;

#[tokio::main]
async fn main() -> Result<(), kc_core::Error> {
    kc_core::logging::init("kc")?;

    let cfg = Arc::new(Config::load()?);
    let mailer = Arc::new(SmtpMailer::from_config(&cfg)?);
    let session = Arc::new(RelaySession::new());

    kc_telegram::router::run_polling(cfg, session, mailer)
        .await
        .map_err(|e| kc_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
