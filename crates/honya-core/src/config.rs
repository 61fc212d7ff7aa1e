use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::HonyaError;
use crate::similarity::ScoringWeights;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Environment variable consulted when `site.cookie` is empty.
pub const COOKIE_ENV: &str = "WNACG_COOKIE";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub site: SiteConfig,
    pub request: RequestConfig,
    pub search: SearchConfig,
    pub directories: DirectoriesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Also write logs to a daily rolling file under the data directory.
    #[serde(default)]
    pub log_to_file: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub domain: String,
    #[serde(default)]
    pub cookie: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub delay_between_requests_secs: u64,
    pub batch_size: usize,
    pub max_pages: u32,
    pub page_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub min_similarity: f64,
    pub page_size: u32,
    #[serde(default)]
    pub weights: ScoringWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoriesConfig {
    /// Search and shelf exports.
    pub search_results: String,
    /// Exports enriched with download links.
    pub downloads: String,
    /// Downloaded archive files.
    pub archives: String,
}

impl AppConfig {
    /// Load config: user file (if exists) merged over built-in defaults.
    pub fn load() -> Result<Self, HonyaError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            toml::from_str(DEFAULT_CONFIG).map_err(|e| HonyaError::Config(e.to_string()))
        }
    }

    /// Load config from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, HonyaError> {
        let user_str =
            std::fs::read_to_string(path).map_err(|e| HonyaError::Config(e.to_string()))?;
        toml::from_str(&user_str).map_err(|e| HonyaError::Config(e.to_string()))
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), HonyaError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| HonyaError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// The cookie to send: config value first, then `WNACG_COOKIE`.
    pub fn cookie(&self) -> Option<String> {
        if !self.site.cookie.trim().is_empty() {
            return Some(self.site.cookie.trim().to_string());
        }
        std::env::var(COOKIE_ENV)
            .ok()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }

    /// Return every problem that would prevent logged-in requests.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.site.domain.trim().is_empty() {
            problems.push("site.domain must not be empty".to_string());
        }
        if self.cookie().is_none() {
            problems.push(format!("set site.cookie in the config file or the {COOKIE_ENV} environment variable"));
        }
        if self.request.batch_size == 0 {
            problems.push("request.batch_size must be at least 1".to_string());
        }
        problems
    }

    /// Directory holding search and shelf exports.
    pub fn search_results_dir(&self) -> PathBuf {
        Self::resolve_dir(&self.directories.search_results)
    }

    /// Directory holding exports enriched with download links.
    pub fn downloads_dir(&self) -> PathBuf {
        Self::resolve_dir(&self.directories.downloads)
    }

    /// Directory receiving downloaded archives.
    pub fn archives_dir(&self) -> PathBuf {
        Self::resolve_dir(&self.directories.archives)
    }

    /// Relative directories live under the platform data directory.
    fn resolve_dir(name: &str) -> PathBuf {
        let path = PathBuf::from(name);
        if path.is_absolute() {
            return path;
        }
        Self::data_dir().join(path)
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Root data directory for exports, downloads and logs.
    pub fn data_dir() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "honya")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}
