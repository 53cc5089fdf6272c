use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CitescopeError, Result};
use crate::models::YearWindow;

/// Root application configuration, loaded from `~/.config/citescope/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub scholar: ScholarApiConfig,
    pub retry: RetryConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of the `<venue+year>/<title>.<ext>` tree.
    pub papers_root: String,
    pub ledger: String,
    pub extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScholarApiConfig {
    pub graph_base_url: String,
    pub legacy_base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub search_limit: u32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first request.
    pub max_attempts: u32,
    pub backoff_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub newest_year: i32,
    pub year_count: usize,
    pub politeness_every: usize,
    pub politeness_pause_secs: u64,
    pub title_match: TitleMatch,
}

/// How a scanned title is tested against the titles already in the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleMatch {
    /// Skip when any recorded title contains the scanned title. A title that is
    /// a substring of a longer recorded title is skipped as well.
    #[default]
    Substring,
    Exact,
}

impl std::str::FromStr for TitleMatch {
    type Err = CitescopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(Self::Substring),
            "exact" => Ok(Self::Exact),
            other => Err(CitescopeError::Config(format!(
                "unknown title_match '{other}', expected 'substring' or 'exact'"
            ))),
        }
    }
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            papers_root: "./data/pdfs".to_string(),
            ledger: "./data/papers_citations_per_year.csv".to_string(),
            extension: "pdf".to_string(),
        }
    }
}

impl Default for ScholarApiConfig {
    fn default() -> Self {
        Self {
            graph_base_url: "https://api.semanticscholar.org/graph/v1".to_string(),
            legacy_base_url: "https://api.semanticscholar.org/v1".to_string(),
            api_key_env: "API_KEY".to_string(),
            search_limit: 3,
            request_timeout_secs: 120,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff_secs: 5,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            newest_year: 2024,
            year_count: 12,
            politeness_every: 100,
            politeness_pause_secs: 1,
            title_match: TitleMatch::default(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/citescope/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("CITESCOPE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("citescope")
            .join("config.toml")
    }

    /// Load config from `path`, falling back to defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.run.year_count == 0 {
            return Err(CitescopeError::Config(
                "run.year_count must be at least 1".to_string(),
            ));
        }
        if self.paths.extension.trim().is_empty() {
            return Err(CitescopeError::Config(
                "paths.extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    // ─── Derived values ────────────────────────────────────

    pub fn papers_root(&self) -> PathBuf {
        PathBuf::from(&self.paths.papers_root)
    }

    pub fn ledger_path(&self) -> PathBuf {
        PathBuf::from(&self.paths.ledger)
    }

    pub fn year_window(&self) -> YearWindow {
        YearWindow::new(self.run.newest_year, self.run.year_count)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.retry.backoff_secs)
    }

    pub fn politeness_pause(&self) -> Duration {
        Duration::from_secs(self.run.politeness_pause_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.scholar.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_matches_ledger_layout() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.retry.max_attempts, 4);
        assert_eq!(cfg.retry.backoff_secs, 5);
        assert_eq!(cfg.run.politeness_every, 100);
        assert_eq!(cfg.scholar.search_limit, 3);
        assert_eq!(cfg.run.title_match, TitleMatch::Substring);

        let years = cfg.year_window();
        assert_eq!(years.years().first(), Some(&2024));
        assert_eq!(years.years().last(), Some(&2013));
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.run.title_match = TitleMatch::Exact;
        cfg.paths.ledger = "/tmp/ledger.csv".to_string();
        cfg.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.run.title_match, TitleMatch::Exact);
        assert_eq!(loaded.paths.ledger, "/tmp/ledger.csv");
        assert_eq!(loaded.scholar.api_key_env, "API_KEY");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retry]\nbackoff_secs = 1\n").unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.retry.backoff_secs, 1);
        assert_eq!(loaded.retry.max_attempts, 4);
        assert_eq!(loaded.paths.extension, "pdf");
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg =
            AppConfig::load_from(Path::new("/tmp/nonexistent_citescope_config.toml")).unwrap();
        assert_eq!(cfg.run.newest_year, 2024);
    }

    #[test]
    fn test_zero_year_count_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[run]\nyear_count = 0\n").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, CitescopeError::Config(_)));
    }

    #[test]
    fn test_title_match_parses() {
        assert_eq!("Exact".parse::<TitleMatch>().unwrap(), TitleMatch::Exact);
        assert_eq!(
            "substring".parse::<TitleMatch>().unwrap(),
            TitleMatch::Substring
        );
        assert!("fuzzy".parse::<TitleMatch>().is_err());
    }
}
