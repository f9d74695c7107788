//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

/// fitforms configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output format when `--format` is auto
    pub default_format: Option<String>,

    /// Extra directory searched for schema documents before the builtins
    pub schema_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/fitforms/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&global_path) {
                    if let Ok(global) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(global);
                    }
                }
            }
        }

        // 3. Environment variables
        if let Ok(format) = std::env::var("FITFORMS_FORMAT") {
            config.default_format = Some(format);
        }
        if let Ok(dir) = std::env::var("FITFORMS_SCHEMA_DIR") {
            config.schema_dir = Some(PathBuf::from(dir));
        }

        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "fitforms")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.schema_dir.is_some() {
            self.schema_dir = other.schema_dir;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_other_wins() {
        let mut base = Config {
            default_format: Some("yaml".into()),
            schema_dir: None,
        };
        base.merge(Config {
            default_format: Some("json".into()),
            schema_dir: Some(PathBuf::from("/tmp/schemas")),
        });
        assert_eq!(base.default_format.as_deref(), Some("json"));
        assert_eq!(base.schema_dir, Some(PathBuf::from("/tmp/schemas")));
    }

    #[test]
    fn test_merge_none_preserves() {
        let mut base = Config {
            default_format: Some("yaml".into()),
            schema_dir: None,
        };
        base.merge(Config::default());
        assert_eq!(base.default_format.as_deref(), Some("yaml"));
    }
}
