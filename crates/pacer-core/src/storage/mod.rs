mod config;
mod kv;
mod params;

pub use config::{Config, LedgerConfig, SessionConfig};
pub use kv::{KvStore, MemoryStore, SqliteStore};
pub use params::{SessionParams, DEFAULT_BACK_LABEL};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `PACER_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/pacer[-dev]/`, with the `-dev` suffix when `PACER_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("PACER_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("PACER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pacer-dev")
            } else {
                base_dir.join("pacer")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
