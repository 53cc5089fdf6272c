use thiserror::Error;

/// All errors that can occur in citescope-core.
#[derive(Debug, Error)]
pub enum CitescopeError {
    #[error("Directory does not exist: {0}")]
    DirectoryNotFound(String),

    #[error("Ledger format error: {0}")]
    LedgerFormat(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, CitescopeError>;
