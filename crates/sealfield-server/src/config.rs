//! Configuration loading and validation for the sealfield service.
//!
//! All values are read from `SEALFIELD_*` environment variables at startup.
//! The process will exit with a clear error message if any required variable
//! is missing or invalid.

use anyhow::{Context, Result};
use sealfield::{KeyMaterial, Secret};
use serde::Deserialize;

/// Validated service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Process default secret, used when neither a field nor the process
    /// key list supplies keys. **Required.**
    pub secret_key: String,

    /// Comma-separated process key list, highest priority first.
    #[serde(default)]
    pub keys: String,

    /// Whether fields derive cipher keys via HKDF unless they say otherwise.
    #[serde(default = "default_use_hkdf")]
    pub use_hkdf: bool,

    /// Path to the YAML or JSON field definition file. **Required.**
    pub fields_path: String,

    /// How often (seconds) to reload field definitions from disk.
    #[serde(default = "default_field_refresh_interval")]
    pub field_refresh_interval_secs: u64,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_use_hkdf() -> bool {
    true
}
fn default_field_refresh_interval() -> u64 {
    300
}
fn default_listen_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("secret_key", &"[REDACTED]")
            .field("keys", &format_args!("[{} REDACTED]", self.key_list().len()))
            .field("use_hkdf", &self.use_hkdf)
            .field("fields_path", &self.fields_path)
            .field("field_refresh_interval_secs", &self.field_refresh_interval_secs)
            .field("listen_port", &self.listen_port)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("SEALFIELD"))
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Non-empty entries of the process key list, in priority order.
    pub fn key_list(&self) -> Vec<&str> {
        self.keys
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect()
    }

    /// Build the immutable process key material. Called once at startup.
    pub fn key_material(&self) -> KeyMaterial {
        KeyMaterial::new(
            Secret::from(self.secret_key.as_str()),
            self.key_list().into_iter().map(Secret::from).collect(),
            self.use_hkdf,
        )
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.secret_key, "SEALFIELD_SECRET_KEY")?;
        ensure_non_empty(&self.fields_path, "SEALFIELD_FIELDS_PATH")?;

        if self.field_refresh_interval_secs == 0 {
            anyhow::bail!("SEALFIELD_FIELD_REFRESH_INTERVAL_SECS must be > 0");
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
