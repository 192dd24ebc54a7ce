use std::time::Duration;
use std::{fs, path::PathBuf};

use common::crypto::{Seed, SeedError};
use common::persist::{RetryPolicy, DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_TIMEOUT};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "tasklist";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";
pub const SEED_FILE_NAME: &str = "seed.pem";
pub const BLOBS_DIR_NAME: &str = "blobs";

pub const DEFAULT_KEY_PAIR_TAG: &str = "todoListModule";
pub const DEFAULT_DATA_KEY_TAG: &str = "todoList";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tag deriving the key pair of the host's task list slot
    #[serde(default = "default_key_pair_tag")]
    pub key_pair_tag: String,
    /// Tag deriving the data key of the host's task list slot
    #[serde(default = "default_data_key_tag")]
    pub data_key_tag: String,
    /// Default log level; `RUST_LOG` still overrides it
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for daily-rolling log files (none: stderr only)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Deadline for each blob store or registry call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Bounds on retrying a save that loses a revision race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff after the first conflict; doubles on each further one
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_key_pair_tag() -> String {
    DEFAULT_KEY_PAIR_TAG.to_string()
}

fn default_data_key_tag() -> String {
    DEFAULT_DATA_KEY_TAG.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_backoff_ms() -> u64 {
    DEFAULT_BACKOFF.as_millis() as u64
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            key_pair_tag: default_key_pair_tag(),
            data_key_tag: default_data_key_tag(),
            log_level: default_log_level(),
            log_dir: None,
            request_timeout_secs: default_request_timeout_secs(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl AppConfig {
    /// Reject settings that would make every network call fail
    pub fn validate(&self) -> Result<(), StateError> {
        if self.request_timeout_secs == 0 {
            return Err(StateError::InvalidConfig(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.backoff_ms),
        )
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.tasklist)
    pub state_dir: PathBuf,
    /// Path to the SQLite registry database
    pub db_path: PathBuf,
    /// Path to the root secret PEM file
    pub seed_path: PathBuf,
    /// Path to the blobs directory
    pub blobs_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.tasklist)
    pub fn state_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory
    ///
    /// Generates a fresh root secret unless one is supplied. The database
    ///  file is created empty; migrations run on first connect.
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
        seed: Option<Seed>,
    ) -> Result<Self, StateError> {
        let config = config.unwrap_or_default();
        config.validate()?;

        let state_dir = Self::state_dir(custom_path)?;

        if state_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&state_dir)?;

        let blobs_path = state_dir.join(BLOBS_DIR_NAME);
        fs::create_dir_all(&blobs_path)?;

        let seed = match seed {
            Some(seed) => seed,
            None => Seed::generate()?,
        };
        let seed_path = state_dir.join(SEED_FILE_NAME);
        fs::write(&seed_path, seed.to_pem())?;

        let config_path = state_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        let db_path = state_dir.join(DB_FILE_NAME);
        fs::write(&db_path, "")?;

        Ok(Self {
            state_dir,
            db_path,
            seed_path,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let state_dir = Self::state_dir(custom_path)?;

        if !state_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let db_path = state_dir.join(DB_FILE_NAME);
        let seed_path = state_dir.join(SEED_FILE_NAME);
        let blobs_path = state_dir.join(BLOBS_DIR_NAME);
        let config_path = state_dir.join(CONFIG_FILE_NAME);

        if !db_path.exists() {
            return Err(StateError::MissingFile(DB_FILE_NAME.to_string()));
        }
        if !seed_path.exists() {
            return Err(StateError::MissingFile(SEED_FILE_NAME.to_string()));
        }
        if !blobs_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", BLOBS_DIR_NAME)));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;
        config.validate()?;

        Ok(Self {
            state_dir,
            db_path,
            seed_path,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Load the root secret from the seed file
    pub fn load_seed(&self) -> Result<Seed, StateError> {
        let pem = fs::read_to_string(&self.seed_path)?;
        let seed = Seed::from_pem(&pem)?;
        Ok(seed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("tasklist directory not initialized. Run 'tasklist init' first")]
    NotInitialized,

    #[error("tasklist directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid root secret: {0}")]
    InvalidSeed(#[from] SeedError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("state");

        let created = AppState::init(Some(dir.clone()), None, None).unwrap();
        assert!(created.blobs_path.is_dir());
        assert!(created.db_path.is_file());

        let loaded = AppState::load(Some(dir)).unwrap();
        assert_eq!(loaded.config, AppConfig::default());
        assert_eq!(loaded.load_seed().unwrap(), created.load_seed().unwrap());
    }

    #[test]
    fn test_init_with_supplied_seed() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("state");
        let seed = Seed::from([4u8; 16]);

        let state = AppState::init(Some(dir), None, Some(seed.clone())).unwrap();
        assert_eq!(state.load_seed().unwrap(), seed);
    }

    #[test]
    fn test_init_twice_fails() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("state");

        AppState::init(Some(dir.clone()), None, None).unwrap();
        let result = AppState::init(Some(dir), None, None);
        assert!(matches!(result, Err(StateError::AlreadyInitialized)));
    }

    #[test]
    fn test_load_uninitialized_fails() {
        let temp = tempfile::tempdir().unwrap();
        let result = AppState::load(Some(temp.path().join("missing")));
        assert!(matches!(result, Err(StateError::NotInitialized)));
    }

    #[test]
    fn test_load_missing_seed_fails() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("state");
        let state = AppState::init(Some(dir.clone()), None, None).unwrap();
        fs::remove_file(&state.seed_path).unwrap();

        let result = AppState::load(Some(dir));
        assert!(matches!(result, Err(StateError::MissingFile(name)) if name == SEED_FILE_NAME));
    }

    #[test]
    fn test_corrupt_seed_file() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("state");
        let state = AppState::init(Some(dir), None, None).unwrap();
        fs::write(&state.seed_path, "not a pem").unwrap();

        assert!(matches!(state.load_seed(), Err(StateError::InvalidSeed(_))));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            data_key_tag = "groceries"

            [retry]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.key_pair_tag, DEFAULT_KEY_PAIR_TAG);
        assert_eq!(config.data_key_tag, "groceries");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.backoff_ms, 100);
        assert_eq!(config.retry_policy().max_attempts(), 5);
    }

    #[test]
    fn test_zero_request_timeout_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("state");
        let state = AppState::init(Some(dir.clone()), None, None).unwrap();
        fs::write(&state.config_path, "request_timeout_secs = 0\n").unwrap();

        let result = AppState::load(Some(dir));
        assert!(matches!(result, Err(StateError::InvalidConfig(_))));

        let config = AppConfig {
            request_timeout_secs: 0,
            ..AppConfig::default()
        };
        let result = AppState::init(Some(temp.path().join("other")), Some(config), None);
        assert!(matches!(result, Err(StateError::InvalidConfig(_))));
        assert!(!temp.path().join("other").exists());
    }
}
