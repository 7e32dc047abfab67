//! Process-wide configuration for autodisable-rs.
//!
//! [`AutoDisableConfig`] holds the defaults every control falls back to when
//! its own options do not say otherwise. [`LazyConfig`] is the one-time
//! registry behind the global [`CONFIG`]: configure it once at startup, before
//! any control is built, and read it anywhere afterwards.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AutoDisableError, AutoDisableResult};

/// Logging configuration consumed by [`crate::logging::setup_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// The log level filter (e.g. "debug", "info", "autodisable_forms=trace").
    pub level: String,
    /// Pretty human-readable output when `true`, JSON lines otherwise.
    pub debug: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            debug: true,
        }
    }
}

/// Default behavior shared by all controls.
///
/// # Examples
///
/// ```
/// use autodisable_core::config::AutoDisableConfig;
///
/// let config = AutoDisableConfig::default();
/// assert!(config.lock_on_complete);
/// assert!(!config.lock_on_complete(Some(false)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoDisableConfig {
    /// Reset a form to pristine after its tracked operation succeeds.
    pub lock_on_complete: bool,
    /// Logging setup.
    pub logging: LoggingConfig,
}

impl Default for AutoDisableConfig {
    fn default() -> Self {
        Self {
            lock_on_complete: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl AutoDisableConfig {
    /// Resolves the effective `lock_on_complete` flag, preferring a
    /// per-control override over the configured default.
    pub fn lock_on_complete(&self, instance_override: Option<bool>) -> bool {
        instance_override.unwrap_or(self.lock_on_complete)
    }

    /// Builds a configuration from a partial document laid over the
    /// defaults. Nested tables are patched key by key, so
    /// `{"logging": {"debug": false}}` keeps the default level.
    ///
    /// ```
    /// use autodisable_core::config::AutoDisableConfig;
    ///
    /// let config = AutoDisableConfig::overlay(serde_json::json!({
    ///     "logging": { "debug": false }
    /// }))
    /// .unwrap();
    /// assert!(config.lock_on_complete);
    /// assert_eq!(config.logging.level, "info");
    /// assert!(!config.logging.debug);
    /// ```
    pub fn overlay(partial: Value) -> AutoDisableResult<Self> {
        let mut document = serde_json::to_value(Self::default())
            .map_err(|e| AutoDisableError::Configuration(format!("Invalid defaults: {e}")))?;
        patch(&mut document, partial);
        serde_json::from_value(document)
            .map_err(|e| AutoDisableError::Configuration(format!("Invalid configuration: {e}")))
    }
}

fn patch(target: &mut Value, partial: Value) {
    match (target, partial) {
        (Value::Object(fields), Value::Object(changes)) => {
            for (key, change) in changes {
                match fields.get_mut(&key) {
                    Some(field) => patch(field, change),
                    None => {
                        fields.insert(key, change);
                    }
                }
            }
        }
        (target, partial) => *target = partial,
    }
}

/// A configuration value that is set at most once.
pub struct LazyConfig {
    inner: OnceLock<AutoDisableConfig>,
}

impl Default for LazyConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LazyConfig {
    /// Creates a new, unconfigured `LazyConfig`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the registry. Only the first call succeeds.
    pub fn configure(&self, config: AutoDisableConfig) -> AutoDisableResult<()> {
        self.inner
            .set(config)
            .map_err(|_| AutoDisableError::AlreadyConfigured)?;
        tracing::debug!(config = ?self.get(), "autodisable configuration installed");
        Ok(())
    }

    /// Configures the registry from a partial JSON object merged over the
    /// defaults, e.g. `{"lockOnComplete": false}`.
    pub fn merge(&self, partial: Value) -> AutoDisableResult<()> {
        self.configure(AutoDisableConfig::overlay(partial)?)
    }

    /// Returns the configured value, or the defaults if never configured.
    pub fn get(&self) -> &AutoDisableConfig {
        static FALLBACK: OnceLock<AutoDisableConfig> = OnceLock::new();
        self.inner
            .get()
            .unwrap_or_else(|| FALLBACK.get_or_init(AutoDisableConfig::default))
    }

    /// Returns `true` if the registry has been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global configuration registry.
///
/// Call `CONFIG.configure(config)` (or `CONFIG.merge(..)`) once at startup;
/// controls built without an explicit configuration read `CONFIG.get()`.
pub static CONFIG: LazyConfig = LazyConfig::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AutoDisableConfig::default();
        assert!(config.lock_on_complete);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.debug);
    }

    #[test]
    fn test_instance_override_wins() {
        let config = AutoDisableConfig {
            lock_on_complete: false,
            ..AutoDisableConfig::default()
        };
        assert!(!config.lock_on_complete(None));
        assert!(config.lock_on_complete(Some(true)));
    }

    #[test]
    fn test_lazy_config_defaults_before_configure() {
        let lazy = LazyConfig::new();
        assert!(!lazy.is_configured());
        assert!(lazy.get().lock_on_complete);
    }

    #[test]
    fn test_overlay_patches_nested_tables() {
        let config = AutoDisableConfig::overlay(serde_json::json!({
            "logging": { "level": "autodisable_forms=trace" },
            "unknown": 1
        }))
        .unwrap();
        assert!(config.lock_on_complete);
        assert_eq!(config.logging.level, "autodisable_forms=trace");
        assert!(config.logging.debug);
    }

    #[test]
    fn test_overlay_replaces_table_with_scalar_is_an_error() {
        let err = AutoDisableConfig::overlay(serde_json::json!({ "logging": "loud" })).unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_lazy_config_configure_once() {
        let lazy = LazyConfig::new();
        lazy.configure(AutoDisableConfig {
            lock_on_complete: false,
            ..AutoDisableConfig::default()
        })
        .unwrap();
        assert!(lazy.is_configured());
        assert!(!lazy.get().lock_on_complete);

        let err = lazy.configure(AutoDisableConfig::default()).unwrap_err();
        assert!(matches!(err, AutoDisableError::AlreadyConfigured));
        assert!(!lazy.get().lock_on_complete);
    }

    #[test]
    fn test_lazy_config_merge_keeps_unset_defaults() {
        let lazy = LazyConfig::new();
        lazy.merge(serde_json::json!({ "lockOnComplete": false }))
            .unwrap();
        assert!(!lazy.get().lock_on_complete);
        assert_eq!(lazy.get().logging.level, "info");
    }

    #[test]
    fn test_lazy_config_merge_rejects_bad_types() {
        let lazy = LazyConfig::new();
        let err = lazy
            .merge(serde_json::json!({ "lockOnComplete": "sometimes" }))
            .unwrap_err();
        assert!(matches!(err, AutoDisableError::Configuration(_)));
        assert!(!lazy.is_configured());
    }
}
