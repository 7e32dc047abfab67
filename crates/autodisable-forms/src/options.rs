//! Per-control options.
//!
//! The marker attribute's value is a JSON object such as
//! `{"pristine": false}`. Absent keys keep their defaults; an absent, blank,
//! `null` or `false` expression means "all defaults".

use serde::{Deserialize, Serialize};
use serde_json::Value;

use autodisable_core::{AutoDisableError, AutoDisableResult};

/// Options resolved for one control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlOptions {
    /// Lock the form while it is pristine.
    pub pristine: bool,
    /// Lock the form while it is invalid.
    pub invalid: bool,
    /// Overrides the configured `lock_on_complete` for this form.
    pub lock_on_complete: Option<bool>,
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            pristine: true,
            invalid: true,
            lock_on_complete: None,
        }
    }
}

impl ControlOptions {
    /// Parses an options expression.
    ///
    /// ```
    /// use autodisable_forms::options::ControlOptions;
    ///
    /// let opts = ControlOptions::parse(Some(r#"{"pristine": false}"#)).unwrap();
    /// assert!(!opts.pristine);
    /// assert!(opts.invalid);
    ///
    /// assert_eq!(ControlOptions::parse(None).unwrap(), ControlOptions::default());
    /// ```
    pub fn parse(expression: Option<&str>) -> AutoDisableResult<Self> {
        let Some(expression) = expression.map(str::trim).filter(|e| !e.is_empty()) else {
            return Ok(Self::default());
        };

        let value: Value = serde_json::from_str(expression).map_err(|e| {
            AutoDisableError::InvalidOptions(format!("'{expression}' is not valid JSON: {e}"))
        })?;

        match value {
            Value::Null | Value::Bool(false) => Ok(Self::default()),
            Value::Object(_) => serde_json::from_value(value).map_err(|e| {
                AutoDisableError::InvalidOptions(format!("'{expression}': {e}"))
            }),
            other => Err(AutoDisableError::InvalidOptions(format!(
                "expected an object, got '{other}'"
            ))),
        }
    }

    /// Decides whether a form with the given validation flags is locked.
    pub const fn should_lock(&self, pristine: bool, invalid: bool) -> bool {
        (pristine && self.pristine) || (invalid && self.invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        for expr in [None, Some(""), Some("   "), Some("null"), Some("false"), Some("{}")] {
            assert_eq!(
                ControlOptions::parse(expr).unwrap(),
                ControlOptions::default(),
                "{expr:?}"
            );
        }
    }

    #[test]
    fn test_parse_all_keys() {
        let opts =
            ControlOptions::parse(Some(r#"{"pristine": false, "invalid": false, "lockOnComplete": false}"#))
                .unwrap();
        assert!(!opts.pristine);
        assert!(!opts.invalid);
        assert_eq!(opts.lock_on_complete, Some(false));
    }

    #[test]
    fn test_parse_ignores_unknown_keys() {
        let opts = ControlOptions::parse(Some(r#"{"colour": "red", "invalid": false}"#)).unwrap();
        assert!(opts.pristine);
        assert!(!opts.invalid);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let err = ControlOptions::parse(Some("{pristine: false")).unwrap_err();
        assert!(matches!(err, AutoDisableError::InvalidOptions(_)));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        let err = ControlOptions::parse(Some("[1, 2]")).unwrap_err();
        assert!(err.to_string().contains("expected an object"));
    }

    #[test]
    fn test_parse_rejects_non_bool_flag() {
        assert!(ControlOptions::parse(Some(r#"{"pristine": "no"}"#)).is_err());
    }

    #[test]
    fn test_should_lock_default_policy() {
        let opts = ControlOptions::default();
        assert!(opts.should_lock(true, false));
        assert!(opts.should_lock(false, true));
        assert!(opts.should_lock(true, true));
        assert!(!opts.should_lock(false, false));
    }

    #[test]
    fn test_should_lock_ignoring_pristine() {
        let opts = ControlOptions {
            pristine: false,
            ..ControlOptions::default()
        };
        assert!(!opts.should_lock(true, false));
        assert!(opts.should_lock(true, true));
        assert!(opts.should_lock(false, true));
    }

    #[test]
    fn test_should_lock_ignoring_invalid() {
        let opts = ControlOptions {
            invalid: false,
            ..ControlOptions::default()
        };
        assert!(!opts.should_lock(false, true));
        assert!(opts.should_lock(true, true));
    }
}
