use thiserror::Error;

/// Errors raised outside the real-time hooks.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to load settings: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("metadata error: {0}")]
    Metadata(String),

    #[error("MIDI output error: {0}")]
    Midi(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
