use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScienceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] citescope_core::CitescopeError),
}

pub type Result<T> = std::result::Result<T, ScienceError>;
