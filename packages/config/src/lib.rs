#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Engine configuration.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `FEEDBACK_MAP_*` environment variables, and are validated last:
//!
//! ```toml
//! catchment_km = 80.0
//! hover_debounce_ms = 150
//! heat_glow_threshold = 15.0
//! lookback_days = 7
//! aggregate_url = "http://localhost:8000"
//! request_timeout_secs = 30
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use feedback_map_analytics::EncoderOptions;
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`EngineConfig::catchment_km`].
pub const ENV_CATCHMENT_KM: &str = "FEEDBACK_MAP_CATCHMENT_KM";
/// Environment variable overriding [`EngineConfig::hover_debounce_ms`].
pub const ENV_HOVER_DEBOUNCE_MS: &str = "FEEDBACK_MAP_HOVER_DEBOUNCE_MS";
/// Environment variable overriding [`EngineConfig::heat_glow_threshold`].
pub const ENV_HEAT_GLOW_THRESHOLD: &str = "FEEDBACK_MAP_HEAT_GLOW_THRESHOLD";
/// Environment variable overriding [`EngineConfig::lookback_days`].
pub const ENV_LOOKBACK_DAYS: &str = "FEEDBACK_MAP_LOOKBACK_DAYS";
/// Environment variable overriding [`EngineConfig::aggregate_url`].
pub const ENV_AGGREGATE_URL: &str = "FEEDBACK_MAP_AGGREGATE_URL";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`EngineConfig`].
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range or could not be parsed.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// Config key or environment variable.
        key: String,
        /// Description of what went wrong.
        message: String,
    },
}

/// Tunable engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Hit resolver catchment radius in kilometers.
    pub catchment_km: f64,
    /// Delay before hiding the tooltip after the pointer loses its target.
    pub hover_debounce_ms: u64,
    /// Heat mode glow threshold on `radius * priority_ratio`.
    pub heat_glow_threshold: f64,
    /// Default lookback window in days.
    pub lookback_days: u32,
    /// Base URL of the dashboard API.
    pub aggregate_url: String,
    /// Per-request timeout for the dashboard API.
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catchment_km: 80.0,
            hover_debounce_ms: 150,
            heat_glow_threshold: 15.0,
            lookback_days: 7,
            aggregate_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl EngineConfig {
    /// Loads defaults, the optional file at `path`, and environment
    /// overrides, then validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, an
    /// environment override cannot be parsed, or a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                log::debug!("Loading config from {}", path.display());
                Self::from_toml_str(&std::fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the document is invalid.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(s)?)
    }

    /// Applies `FEEDBACK_MAP_*` overrides using `lookup` to read variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable is set but
    /// cannot be parsed.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = parse_override(&lookup, ENV_CATCHMENT_KM)? {
            self.catchment_km = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_HOVER_DEBOUNCE_MS)? {
            self.hover_debounce_ms = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_HEAT_GLOW_THRESHOLD)? {
            self.heat_glow_threshold = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_LOOKBACK_DAYS)? {
            self.lookback_days = v;
        }
        if let Some(url) = lookup(ENV_AGGREGATE_URL) {
            log::debug!("{ENV_AGGREGATE_URL} overrides aggregate_url");
            self.aggregate_url = url;
        }
        Ok(())
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.catchment_km.is_finite() && self.catchment_km > 0.0) {
            return Err(invalid("catchment_km", "must be a positive number of kilometers"));
        }
        if self.hover_debounce_ms == 0 {
            return Err(invalid("hover_debounce_ms", "must be greater than zero"));
        }
        if !(self.heat_glow_threshold.is_finite() && self.heat_glow_threshold >= 0.0) {
            return Err(invalid("heat_glow_threshold", "must be a non-negative number"));
        }
        if self.lookback_days == 0 {
            return Err(invalid("lookback_days", "must be at least one day"));
        }
        if self.aggregate_url.trim().is_empty() {
            return Err(invalid("aggregate_url", "must not be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be greater than zero"));
        }
        Ok(())
    }

    /// Hover hide delay.
    #[must_use]
    pub const fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hover_debounce_ms)
    }

    /// HTTP request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Encoder settings derived from this config.
    #[must_use]
    pub const fn encoder_options(&self) -> EncoderOptions {
        EncoderOptions {
            heat_glow_threshold: self.heat_glow_threshold,
        }
    }
}

fn parse_override<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    log::debug!("{key} overrides config value with '{raw}'");
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| invalid(key, &format!("'{raw}': {e}")))
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.hide_delay(), Duration::from_millis(150));
        assert!((config.encoder_options().heat_glow_threshold - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config =
            EngineConfig::from_toml_str("catchment_km = 40.0\nlookback_days = 30\n").unwrap();
        assert!((config.catchment_km - 40.0).abs() < f64::EPSILON);
        assert_eq!(config.lookback_days, 30);
        assert_eq!(config.hover_debounce_ms, 150);
        assert_eq!(config.aggregate_url, "http://localhost:8000");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = EngineConfig::from_toml_str("catchment = 40.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn env_overrides_file() {
        let mut config = EngineConfig::from_toml_str("hover_debounce_ms = 300\n").unwrap();
        config
            .apply_overrides(env(&[
                (ENV_HOVER_DEBOUNCE_MS, "200"),
                (ENV_AGGREGATE_URL, "https://api.example.org"),
                (ENV_HEAT_GLOW_THRESHOLD, " 20.5 "),
            ]))
            .unwrap();
        assert_eq!(config.hover_debounce_ms, 200);
        assert_eq!(config.aggregate_url, "https://api.example.org");
        assert!((config.heat_glow_threshold - 20.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unparseable_override_names_variable() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_overrides(env(&[(ENV_LOOKBACK_DAYS, "a week")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, ENV_LOOKBACK_DAYS),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validation_rejects_out_of_range() {
        let cases = [
            EngineConfig {
                catchment_km: 0.0,
                ..EngineConfig::default()
            },
            EngineConfig {
                catchment_km: f64::NAN,
                ..EngineConfig::default()
            },
            EngineConfig {
                hover_debounce_ms: 0,
                ..EngineConfig::default()
            },
            EngineConfig {
                lookback_days: 0,
                ..EngineConfig::default()
            },
            EngineConfig {
                aggregate_url: "  ".to_string(),
                ..EngineConfig::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?} should be invalid");
        }
    }

    #[test]
    fn load_reads_file() {
        let path =
            std::env::temp_dir().join(format!("feedback_map_config_{}.toml", std::process::id()));
        std::fs::write(&path, "request_timeout_secs = 5\n").unwrap();
        let config = EngineConfig::load(Some(&path));
        std::fs::remove_file(&path).ok();

        // Environment overrides may be present on the test machine, so
        // only check the value that has no override.
        assert_eq!(config.unwrap().request_timeout_secs, 5);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("feedback_map_config_missing.toml");
        assert!(matches!(EngineConfig::load(Some(&path)), Err(ConfigError::Io(_))));
    }
}
