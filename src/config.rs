use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::session::SessionConfig;

pub const DEFAULT_EXAM: &str = "ai-practitioner";
pub const DEFAULT_TOTAL_EXAM_SECONDS: u64 = 10 * 60;
pub const DEFAULT_PER_QUESTION_SECONDS: u64 = 180;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub exam_type: String,
    pub total_exam_seconds: u64,
    pub per_question_seconds: u64,
    /// Percentage shown as the pass mark on the results screen
    pub pass_mark: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exam_type: DEFAULT_EXAM.to_string(),
            total_exam_seconds: DEFAULT_TOTAL_EXAM_SECONDS,
            per_question_seconds: DEFAULT_PER_QUESTION_SECONDS,
            pass_mark: 70,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(
            self.exam_type.clone(),
            self.total_exam_seconds,
            self.per_question_seconds,
        )
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
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("examify_config.json"));
        Self { path }
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
                Err(e) => log::warn!("ignoring unreadable config {}: {}", self.path.display(), e),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
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
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            exam_type: "athena".into(),
            total_exam_seconds: 1800,
            per_question_seconds: 90,
            pass_mark: 80,
        };
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_or_broken_file_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"per_question_seconds": 60}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.per_question_seconds, 60);
        assert_eq!(cfg.total_exam_seconds, DEFAULT_TOTAL_EXAM_SECONDS);
        assert_eq!(cfg.exam_type, DEFAULT_EXAM);
    }

    #[test]
    fn session_config_from_config() {
        let sc = Config::default().session_config();
        assert_eq!(sc.exam_type, DEFAULT_EXAM);
        assert_eq!(sc.total_exam_seconds, 600);
        assert_eq!(sc.per_question_seconds, 180);
    }
}
