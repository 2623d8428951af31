//! Configuration loading for vigil.
//!
//! Configuration is loaded from a TOML file (default:
//! `<config dir>/vigil/vigil.toml`). Every field is optional; command-line
//! flags and `VIGIL_TOKEN` override the file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sync_client::{StoreConfig, DEFAULT_ENDPOINT, DEFAULT_FILE_NAME};

/// Root configuration for vigil.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which document to sync.
    pub document: DocumentConfig,
    /// Credentials.
    pub auth: AuthConfig,
    /// Polling configuration.
    pub poll: PollConfig,
}

/// Document configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    /// Document id (required, here or via `--document`).
    pub id: Option<String>,
    /// Tracked file inside the document (default: candles.json).
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// API base URL (default: https://api.github.com/gists).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Credential configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Bearer token. Absent means read-only.
    pub token: Option<String>,
}

/// Polling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Seconds between polls in `watch` (default: 5).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

// Default value functions
fn default_file_name() -> String {
    DEFAULT_FILE_NAME.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_interval_secs() -> u64 {
    5
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            id: None,
            file_name: default_file_name(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

/// Values from the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--document`
    pub document: Option<String>,
    /// `--token` / `VIGIL_TOKEN`
    pub token: Option<String>,
}

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Store connection settings.
    pub store: StoreConfig,
    /// Polling cadence for `watch`.
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load an explicit file, or the default file if it exists.
    ///
    /// A missing default file yields all defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Apply overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDocument`] when no document id is
    /// configured anywhere, and [`ConfigError::Invalid`] for zero intervals.
    pub fn resolve(self, overrides: Overrides) -> Result<Settings, ConfigError> {
        let document_id = overrides
            .document
            .or(self.document.id)
            .filter(|id| !id.trim().is_empty())
            .ok_or(ConfigError::MissingDocument)?;

        if self.poll.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll.interval_secs must be at least 1".into(),
            ));
        }
        if self.document.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "document.timeout_secs must be at least 1".into(),
            ));
        }

        let mut store = StoreConfig::new(document_id)
            .with_endpoint(self.document.endpoint)
            .with_file_name(self.document.file_name)
            .with_timeout(Duration::from_secs(self.document.timeout_secs));
        if let Some(token) = overrides.token.or(self.auth.token) {
            store = store.with_token(token);
        }

        Ok(Settings {
            store,
            poll_interval: Duration::from_secs(self.poll.interval_secs),
        })
    }
}

/// Default configuration file location.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "ydun", "vigil")
        .map(|dirs| dirs.config_dir().join("vigil.toml"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// No document id in the file or on the command line.
    #[error("no document id configured: set [document] id or pass --document")]
    MissingDocument,
    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_without_file_content() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.document.id, None);
        assert_eq!(config.document.file_name, "candles.json");
        assert_eq!(config.document.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.poll.interval_secs, 5);
        assert_eq!(config.auth.token, None);
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[document]
id = "3f1a9c"
file_name = "board.json"
endpoint = "http://localhost:8080/gists"

[auth]
token = "ghp_abc"

[poll]
interval_secs = 10
"#;

        let settings = toml::from_str::<Config>(toml)
            .unwrap()
            .resolve(Overrides::default())
            .unwrap();
        assert_eq!(settings.store.document_id(), "3f1a9c");
        assert_eq!(settings.store.file_name(), "board.json");
        assert_eq!(settings.store.endpoint(), "http://localhost:8080/gists");
        assert_eq!(settings.store.token(), Some("ghp_abc"));
        assert_eq!(settings.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn overrides_win_over_file() {
        let toml = r#"
[document]
id = "from-file"

[auth]
token = "file-token"
"#;
        let settings = toml::from_str::<Config>(toml)
            .unwrap()
            .resolve(Overrides {
                document: Some("from-flag".into()),
                token: Some("flag-token".into()),
            })
            .unwrap();
        assert_eq!(settings.store.document_id(), "from-flag");
        assert_eq!(settings.store.token(), Some("flag-token"));
    }

    #[test]
    fn missing_document_is_an_error() {
        let err = Config::default().resolve(Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingDocument));

        let blank = Overrides {
            document: Some("  ".into()),
            token: None,
        };
        assert!(Config::default().resolve(blank).is_err());
    }

    #[test]
    fn missing_token_is_read_only() {
        let settings = Config::default()
            .resolve(Overrides {
                document: Some("abc".into()),
                token: None,
            })
            .unwrap();
        assert_eq!(settings.store.token(), None);
    }

    #[test]
    fn zero_interval_is_invalid() {
        let toml = "[document]\nid = \"abc\"\n[poll]\ninterval_secs = 0\n";
        let err = toml::from_str::<Config>(toml)
            .unwrap()
            .resolve(Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn from_file_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[document").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("failed to parse config file"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::ReadError { .. })
        ));
    }
}
