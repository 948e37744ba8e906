use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = ".taskden/config.toml";
pub const DEFAULT_DB_PATH: &str = ".taskden/state.sqlite";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub db_path: String,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub log_format: LogFormat,
    /// Page size for search commands that do not pass `--limit`.
    pub page_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            log_filter: "warn".to_string(),
            log_format: LogFormat::Text,
            page_size: 20,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} not found", .0.display())]
    Missing(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

impl Config {
    /// Loads `explicit` when given (it must exist), otherwise the default
    /// location, falling back to built-in defaults when that is absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) if !path.exists() => Err(ConfigError::Missing(path.to_path_buf())),
            Some(path) => Self::read(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::read(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw, path)
    }

    pub(crate) fn from_toml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.page_size == 0 {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                message: "page_size must be at least 1".to_string(),
            });
        }
        if config.db_path.trim().is_empty() {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                message: "db_path must not be empty".to_string(),
            });
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use uuid::Uuid;

    use super::{Config, ConfigError, LogFormat, DEFAULT_DB_PATH};

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml("", Path::new("inline.toml")).expect("empty config parses");
        assert_eq!(config, Config::default());
        assert_eq!(config.db_path, DEFAULT_DB_PATH);
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn parses_every_field() {
        let raw = r#"
db_path = "/tmp/den.sqlite"
log_filter = "taskden=debug"
log_format = "json"
page_size = 5
"#;
        let config = Config::from_toml(raw, Path::new("inline.toml")).expect("config parses");
        assert_eq!(config.db_path, "/tmp/den.sqlite");
        assert_eq!(config.log_filter, "taskden=debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.page_size, 5);
    }

    #[test]
    fn rejects_zero_page_size_and_unknown_keys() {
        let err = Config::from_toml("page_size = 0", Path::new("inline.toml"))
            .expect_err("zero page size is invalid");
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = Config::from_toml("pagesize = 3", Path::new("inline.toml"))
            .expect_err("unknown keys are rejected");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn explicit_path_must_exist_but_file_is_read_when_present() {
        let path = std::env::temp_dir().join(format!("taskden-config-{}.toml", Uuid::now_v7()));
        let err = Config::load(Some(&path)).expect_err("missing explicit config fails");
        assert!(matches!(err, ConfigError::Missing(_)));

        std::fs::write(&path, "page_size = 7\n").expect("config should be writable");
        let config = Config::load(Some(&path)).expect("config should load");
        assert_eq!(config.page_size, 7);
        let _ = std::fs::remove_file(&path);
    }
}
