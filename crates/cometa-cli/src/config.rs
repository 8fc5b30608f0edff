//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cometa_core::Locale;
use cometa_db::ReadBackPolicy;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Language for labels and headings.
    pub locale: Locale,

    /// Staff member recorded as the author of changes, unless `--by` is given.
    pub staff_id: Option<String>,

    /// Reads made to confirm a write before giving up.
    pub read_back_attempts: u32,

    /// Pause between confirmation reads, in milliseconds.
    pub read_back_backoff_ms: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("locale", &self.locale)
            .field("staff_id", &self.staff_id)
            .field("read_back_attempts", &self.read_back_attempts)
            .field("read_back_backoff_ms", &self.read_back_backoff_ms)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let read_back = ReadBackPolicy::default();
        Self {
            database_path: data_dir.join("cometa.db"),
            locale: Locale::Es,
            staff_id: None,
            read_back_attempts: read_back.attempts,
            read_back_backoff_ms: u64::try_from(read_back.backoff.as_millis()).unwrap_or(50),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (COMETA_*)
        figment = figment.merge(Env::prefixed("COMETA_"));

        figment.extract()
    }

    /// The read-back policy the store should use.
    pub const fn read_back_policy(&self) -> ReadBackPolicy {
        ReadBackPolicy {
            attempts: self.read_back_attempts,
            backoff: Duration::from_millis(self.read_back_backoff_ms),
        }
    }
}

/// Returns the platform-specific config directory for cometa.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("cometa"))
}

/// Returns the platform-specific data directory for cometa.
///
/// On Linux: `~/.local/share/cometa`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("cometa"))
}
