/// Core error type.
///
/// Adapter crates map their library errors into this type so the bot core
/// can treat failures uniformly (record + short user-facing message).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("download error: {0}")]
    Download(String),

    #[error("mail error: {0}")]
    Mail(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
