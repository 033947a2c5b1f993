use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Form,
    Sheet,
}

/// Opaque form entry ids, one per record field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormFields {
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub duration: String,
    pub task_description: String,
    pub location: String,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            name: "entry.116257796".to_string(),
            start_time: "entry.844414881".to_string(),
            end_time: "entry.834530983".to_string(),
            duration: "entry.365539651".to_string(),
            task_description: "entry.1897147484".to_string(),
            location: "entry.1523129993".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub base_url: String,
    pub form_id: String,
    pub fields: FormFields,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            base_url: "https://docs.google.com".to_string(),
            form_id: "1FAIpQLSfW0gh8rbHtgeUOLfTP9rxV5aKHI-kcbJ94bbSDNN2c5cZ8EQ".to_string(),
            fields: FormFields::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub api_base: String,
    pub spreadsheet_url: String,
    pub worksheet: String,
    /// Environment variable holding an OAuth access token
    pub token_env: String,
    /// File holding an OAuth access token; wins over `token_env` when set
    pub token_file: Option<PathBuf>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            api_base: "https://sheets.googleapis.com".to_string(),
            spreadsheet_url:
                "https://docs.google.com/spreadsheets/d/1ceutTaxlt9vYK_17L_nFE8O8jyJpUbmFctoSvecVQjQ/edit?usp=sharing"
                    .to_string(),
            worksheet: "Sheet1".to_string(),
            token_env: "FOCUS_SHEETS_TOKEN".to_string(),
            token_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub owner_name: Option<String>,
    pub sink: SinkKind,
    pub form: FormConfig,
    pub sheet: SheetConfig,
    pub timeout_secs: u64,
    pub require_description: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner_name: None,
            sink: SinkKind::Form,
            form: FormConfig::default(),
            sheet: SheetConfig::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            require_description: true,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!(
                    "ignoring unreadable config {}: {e}",
                    self.path.display()
                ),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_sheet_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            owner_name: Some("Alice".into()),
            sink: SinkKind::Sheet,
            sheet: SheetConfig {
                worksheet: "Hours".into(),
                token_file: Some(PathBuf::from("/run/secrets/sheets-token")),
                ..SheetConfig::default()
            },
            timeout_secs: 30,
            require_description: false,
            ..Config::default()
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn garbage_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"sink": "sheet", "sheet": {"worksheet": "Log"}}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.sink, SinkKind::Sheet);
        assert_eq!(cfg.sheet.worksheet, "Log");
        assert_eq!(cfg.sheet.token_env, "FOCUS_SHEETS_TOKEN");
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(cfg.require_description);
    }

    #[test]
    fn timeout_is_at_least_one_second() {
        let cfg = Config {
            timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(cfg.timeout(), Duration::from_secs(1));
        assert_eq!(Config::default().timeout(), Duration::from_secs(10));
    }
}
