use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

const DEFAULT_IDLE_SLEEP_SECONDS: u64 = 2 * 60 * 60;
const DEFAULT_WATCHDOG_POLL_SECONDS: u64 = 30;

// Telegram's bot API refuses to serve files above 20MB, so there is no point
// accepting anything larger.
const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Typed configuration, loaded once at process start.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub allowed_user_id: i64,

    // Mail account + destination.
    pub kindle_email: String,
    pub smtp_address: String,
    pub smtp_app_password: String,
    pub smtp_host: String,
    pub smtp_port: u16,

    // Session behavior.
    pub idle_sleep: Duration,
    pub watchdog_poll: Duration,
    pub max_file_size: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .ok_or_else(|| required("TELEGRAM_BOT_TOKEN"))?;

        let allowed_user_id = env_i64("ALLOWED_USER_ID")
            .filter(|id| *id != 0)
            .ok_or_else(|| required("ALLOWED_USER_ID"))?;

        let kindle_email = env_str("KINDLE_EMAIL")
            .and_then(non_empty)
            .ok_or_else(|| required("KINDLE_EMAIL"))?;

        let smtp_address = env_str("SMTP_ADDRESS")
            .and_then(non_empty)
            .ok_or_else(|| required("SMTP_ADDRESS"))?;
        let smtp_app_password = env_str("SMTP_APP_PASSWORD")
            .and_then(non_empty)
            .ok_or_else(|| required("SMTP_APP_PASSWORD"))?;

        let smtp_host = env_str("SMTP_HOST")
            .and_then(non_empty)
            .unwrap_or_else(|| "smtp.gmail.com".to_string());
        let smtp_port = env_u16("SMTP_PORT").unwrap_or(465);

        let idle_sleep = Duration::from_secs(
            env_u64("IDLE_SLEEP_SECONDS").unwrap_or(DEFAULT_IDLE_SLEEP_SECONDS),
        );
        let watchdog_poll = Duration::from_secs(
            env_u64("WATCHDOG_POLL_SECONDS").unwrap_or(DEFAULT_WATCHDOG_POLL_SECONDS),
        );
        let max_file_size = env_u64("MAX_FILE_SIZE").unwrap_or(DEFAULT_MAX_FILE_SIZE);

        Ok(Self {
            telegram_bot_token,
            allowed_user_id,
            kindle_email,
            smtp_address,
            smtp_app_password,
            smtp_host,
            smtp_port,
            idle_sleep,
            watchdog_poll,
            max_file_size,
        })
    }
}

fn required(key: &str) -> Error {
    Error::Config(format!("{key} environment variable is required"))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u16(key: &str) -> Option<u16> {
    env_str(key).and_then(|s| s.trim().parse::<u16>().ok())
}

fn env_i64(key: &str) -> Option<i64> {
    env_str(key).and_then(|s| s.trim().parse::<i64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
