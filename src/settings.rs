//! Runtime settings for bound host types.
//!
//! Binding always starts from [`Settings::default`]. Settings taken from the
//! process environment are opt-in through [`Settings::from_env`] and
//! `BoundType::with_settings`. Values are parsed strictly: anything that is
//! not an exact boolean or number is rejected rather than silently treated
//! as a default.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Whether fired transitions are recorded (`true` or `false`).
pub const RECORD_HISTORY_VAR: &str = "STATEHOLD_RECORD_HISTORY";

/// Maximum number of recorded transitions kept per host.
pub const HISTORY_LIMIT_VAR: &str = "STATEHOLD_HISTORY_LIMIT";

/// Transitions kept per host unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Record every fired transition in the host's history.
    pub record_history: bool,
    /// Keep at most this many transitions, dropping the oldest. `None`
    /// keeps every transition for the lifetime of the host.
    pub history_limit: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            record_history: true,
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Settings, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key/value source. Unset keys keep their
    /// default.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(value) = lookup(RECORD_HISTORY_VAR) {
            settings.record_history = parse_bool(RECORD_HISTORY_VAR, &value)?;
        }
        if let Some(value) = lookup(HISTORY_LIMIT_VAR) {
            let limit = value
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid(HISTORY_LIMIT_VAR, &value, "a non-negative integer"))?;
            settings.history_limit = Some(limit);
        }

        Ok(settings)
    }

    pub fn without_history(mut self) -> Self {
        self.record_history = false;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn with_unbounded_history(mut self) -> Self {
        self.history_limit = None;
        self
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(key, value, "true or false")),
    }
}

fn invalid(key: &str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn unset_keys_keep_defaults() {
        assert_eq!(Settings::from_lookup(lookup(&[])), Ok(Settings::default()));
    }

    #[test]
    fn booleans_are_case_insensitive() {
        let settings = Settings::from_lookup(lookup(&[(RECORD_HISTORY_VAR, "FALSE")])).unwrap();
        assert!(!settings.record_history);
    }

    #[test]
    fn loose_booleans_are_rejected() {
        let result = Settings::from_lookup(lookup(&[(RECORD_HISTORY_VAR, "yes")]));

        assert_eq!(
            result,
            Err(ConfigError::InvalidSetting {
                key: RECORD_HISTORY_VAR.to_string(),
                value: "yes".to_string(),
                expected: "true or false",
            })
        );
    }

    #[test]
    fn history_limit_must_be_a_number() {
        let settings = Settings::from_lookup(lookup(&[(HISTORY_LIMIT_VAR, " 16 ")])).unwrap();
        assert_eq!(settings.history_limit, Some(16));

        assert!(matches!(
            Settings::from_lookup(lookup(&[(HISTORY_LIMIT_VAR, "-1")])),
            Err(ConfigError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn builders_override_fields() {
        let settings = Settings::default().without_history().with_history_limit(3);

        assert!(!settings.record_history);
        assert_eq!(settings.history_limit, Some(3));
        assert_eq!(settings.with_unbounded_history().history_limit, None);
    }

    #[test]
    fn default_history_is_bounded() {
        assert_eq!(
            Settings::default().history_limit,
            Some(DEFAULT_HISTORY_LIMIT)
        );
    }
}
