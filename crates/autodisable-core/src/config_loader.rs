//! Configuration loading from files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with the default configuration.
//! 2. Load from a TOML or JSON document (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `AUTODISABLE_LOCK_ON_COMPLETE` | `lock_on_complete` |
//! | `AUTODISABLE_LOG_LEVEL` | `logging.level` |
//! | `AUTODISABLE_DEBUG` | `logging.debug` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use autodisable_core::{config_loader, CONFIG};
//!
//! let config = config_loader::from_toml_file_with_env("autodisable.toml").unwrap();
//! CONFIG.configure(config).unwrap();
//! ```

use std::path::Path;

use crate::config::AutoDisableConfig;
use crate::error::{AutoDisableError, AutoDisableResult};

/// Loads configuration from a TOML string, keeping defaults for absent keys.
///
/// ```
/// use autodisable_core::config_loader::from_toml_str;
///
/// let config = from_toml_str("lockOnComplete = false").unwrap();
/// assert!(!config.lock_on_complete);
/// ```
pub fn from_toml_str(toml_str: &str) -> AutoDisableResult<AutoDisableConfig> {
    let partial: serde_json::Value = toml::from_str(toml_str)
        .map_err(|e| AutoDisableError::Configuration(format!("Failed to parse TOML: {e}")))?;
    with_format("TOML", AutoDisableConfig::overlay(partial))
}

/// Loads configuration from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> AutoDisableResult<AutoDisableConfig> {
    from_toml_str(&read(path.as_ref(), "TOML")?)
}

/// Loads configuration from a TOML file, then applies environment overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> AutoDisableResult<AutoDisableConfig> {
    let mut config = from_toml_file(path)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Loads configuration from a JSON string, keeping defaults for absent keys.
pub fn from_json_str(json_str: &str) -> AutoDisableResult<AutoDisableConfig> {
    let partial: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| AutoDisableError::Configuration(format!("Failed to parse JSON: {e}")))?;
    with_format("JSON", AutoDisableConfig::overlay(partial))
}

/// Loads configuration from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> AutoDisableResult<AutoDisableConfig> {
    from_json_str(&read(path.as_ref(), "JSON")?)
}

/// Loads configuration from environment variables only, starting from defaults.
pub fn from_env() -> AutoDisableConfig {
    let mut config = AutoDisableConfig::default();
    apply_env_overrides(&mut config);
    config
}

/// Applies `AUTODISABLE_*` environment variable overrides.
///
/// Boolean values accept "true"/"1"/"yes" (case-insensitive) as true and
/// anything else as false.
pub fn apply_env_overrides(config: &mut AutoDisableConfig) {
    if let Ok(val) = std::env::var("AUTODISABLE_LOCK_ON_COMPLETE") {
        config.lock_on_complete = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("AUTODISABLE_LOG_LEVEL") {
        config.logging.level = val;
    }

    if let Ok(val) = std::env::var("AUTODISABLE_DEBUG") {
        config.logging.debug = parse_flag(&val);
    }
}

// ============================================================
// Helpers
// ============================================================

fn parse_flag(val: &str) -> bool {
    matches!(val.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

fn read(path: &Path, format: &str) -> AutoDisableResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        AutoDisableError::Configuration(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn with_format(
    format: &str,
    result: AutoDisableResult<AutoDisableConfig>,
) -> AutoDisableResult<AutoDisableConfig> {
    result.map_err(|e| match e {
        AutoDisableError::Configuration(msg) => {
            AutoDisableError::Configuration(format!("{format}: {msg}"))
        }
        other => other,
    })
}
