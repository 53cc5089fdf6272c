pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, TitleMatch};
pub use error::{CitescopeError, Result};
pub use models::*;

pub use storage::ledger::{KnownTitles, LedgerWriter, ledger_header, read_known_titles};
pub use storage::scan::{paper_from_path, scan_papers};
