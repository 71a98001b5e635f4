//! Layered CLI configuration
//!
//! Precedence, lowest first: built-in defaults, the TOML file, `SNAPVAULT_*`
//! environment variables, command-line flags. Every field can be set from the
//! environment as `SNAPVAULT_<FIELD>`, e.g. `SNAPVAULT_LIST_LIMIT`.

use ::config::{Config, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use snapvault_core::errors::{ExError, ExErrorKind, Result};
use snapvault_core::logging_facility::Profile;
use snapvault_core::AesGcmCipher;
use snapvault_core_types::Sensitive;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "snapvault.toml";

/// Prefix of the environment variables that override file values
pub const ENV_PREFIX: &str = "SNAPVAULT";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapvaultConfig {
    pub db_path: PathBuf,
    pub busy_timeout_ms: u64,
    pub log_profile: String,
    /// Hex-encoded 32-byte AES key; content is stored in clear when unset
    pub encryption_key: Option<String>,
    pub index_weight: u32,
    pub list_limit: usize,
}

impl Default for SnapvaultConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(".snapvault/snapshots.db"),
            busy_timeout_ms: 5000,
            log_profile: "development".to_string(),
            encryption_key: None,
            index_weight: 1,
            list_limit: 1000,
        }
    }
}

impl std::fmt::Debug for SnapvaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapvaultConfig")
            .field("db_path", &self.db_path)
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .field("log_profile", &self.log_profile)
            .field("encryption_key", &self.encryption_key.as_ref().map(Sensitive::new))
            .field("index_weight", &self.index_weight)
            .field("list_limit", &self.list_limit)
            .finish()
    }
}

/// Values supplied as command-line flags
#[derive(Debug, Default)]
pub struct Overrides {
    pub db_path: Option<PathBuf>,
    pub log_profile: Option<String>,
}

impl SnapvaultConfig {
    /// Resolve the effective configuration for this process
    ///
    /// # Errors
    ///
    /// `Config` if an explicit file is missing or malformed, or if any
    /// resolved value is invalid.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(path, None, overrides)
    }

    /// `env` stands in for the process environment when set
    fn load_with_env(
        path: Option<&Path>,
        env: Option<Map<String, String>>,
        overrides: &Overrides,
    ) -> Result<Self> {
        let (file_path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };
        let entity = file_path.display().to_string();

        let db_flag = overrides
            .db_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());

        let config: Self = Config::builder()
            .add_source(File::from(file_path).format(FileFormat::Toml).required(required))
            .add_source(Environment::with_prefix(ENV_PREFIX).ignore_empty(true).source(env))
            .set_override_option("db_path", db_flag)
            .and_then(|b| b.set_override_option("log_profile", overrides.log_profile.clone()))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(|e| config_error(format!("invalid config: {}", e)).with_entity_id(entity))?;

        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// `Config` on invalid TOML or mistyped values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(|e| config_error(format!("invalid config: {}", e)))
    }

    /// # Errors
    ///
    /// `Config` for an unknown profile name.
    pub fn profile(&self) -> Result<Profile> {
        self.log_profile.parse().map_err(config_error)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// # Errors
    ///
    /// `Config` if the key is not 64 hex characters.
    pub fn cipher(&self) -> Result<Option<AesGcmCipher>> {
        self.encryption_key
            .as_deref()
            .map(AesGcmCipher::from_hex)
            .transpose()
    }

    fn validate(&self) -> Result<()> {
        self.profile()?;
        self.cipher()?;
        if self.db_path.as_os_str().is_empty() {
            return Err(config_error("db_path must not be empty"));
        }
        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("load_config")
        .with_message(message)
}
