use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::Role;
use crate::calendar::selector::{YearBounds, DEFAULT_FUTURE_YEARS, DEFAULT_PAST_YEARS};
use crate::calendar::Period;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub api:      Option<ApiConfig>,
    pub selector: Option<SelectorConfig>,
}

fn default_role()    -> Role { Role::Owner }
fn default_timeout() -> u64  { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url:        String,
    #[serde(default = "default_role")]
    pub role:            Role,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Restrict dashboard statistics to one homestay.
    pub homestay_id:     Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SelectorConfig {
    pub past_years:     Option<u32>,
    pub future_years:   Option<u32>,
    pub default_period: Option<Period>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir().join("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            Ok(toml::from_str(&std::fs::read_to_string(path)?)?)
        } else {
            Ok(AppConfig::default())
        }
    }

    pub fn year_bounds(&self) -> YearBounds {
        let sel = self.selector.as_ref();
        YearBounds {
            past:   sel.and_then(|s| s.past_years).unwrap_or(DEFAULT_PAST_YEARS),
            future: sel.and_then(|s| s.future_years).unwrap_or(DEFAULT_FUTURE_YEARS),
        }
    }

    pub fn default_period(&self) -> Period {
        self.selector.as_ref().and_then(|s| s.default_period).unwrap_or_default()
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("staydash")
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("staydash")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(cfg.api.is_none());
        assert_eq!(cfg.year_bounds(), YearBounds { past: 10, future: 10 });
        assert_eq!(cfg.default_period(), Period::Week);
    }

    #[test]
    fn parses_sections() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, r#"
            [api]
            base_url = "http://localhost:8080/api"
            role = "admin"

            [selector]
            past_years = 3
            default_period = "month"
        "#).unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        let api = cfg.api.as_ref().unwrap();
        assert_eq!(api.base_url, "http://localhost:8080/api");
        assert_eq!(api.role, Role::Admin);
        assert_eq!(api.timeout_seconds, 30);
        assert!(api.homestay_id.is_none());
        assert_eq!(cfg.year_bounds(), YearBounds { past: 3, future: 10 });
        assert_eq!(cfg.default_period(), Period::Month);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nbase_url = 3\n").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }
}
