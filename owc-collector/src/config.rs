//! Runtime configuration for the collection pipeline
//!
//! Built once at startup from the TOML bootstrap file and the environment,
//! then handed to the orchestrator. API key priority: ENV → TOML.

use owc_common::config::{CollectorSection, TomlConfig};
use owc_common::{Error, Result};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable holding the upstream API key
pub const API_KEY_ENV: &str = "OWC_API_KEY";

/// Collection pipeline settings
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Upstream API credential
    pub api_key: String,
    /// Upstream API base URL
    pub base_url: String,
    /// Ordered cities collected for every job
    pub target_set: Arc<[i64]>,
    /// Requests per wave
    pub wave_width: NonZeroUsize,
    /// Minimum wall-clock duration of one wave
    pub min_wave_duration: Duration,
    /// Timeout applied to each upstream request
    pub request_timeout: Duration,
}

impl CollectionConfig {
    /// Resolve and validate the pipeline configuration
    pub fn from_toml(toml_config: &TomlConfig) -> Result<Self> {
        let section = &toml_config.collector;
        let api_key = resolve_api_key(section)?;
        let target_set = load_target_set(section)?;

        let wave_width = NonZeroUsize::new(section.wave_width)
            .ok_or_else(|| Error::Config("wave_width must be at least 1".to_string()))?;

        if !section.min_wave_duration_secs.is_finite() || section.min_wave_duration_secs < 0.0 {
            return Err(Error::Config(format!(
                "min_wave_duration_secs must be a non-negative number, got {}",
                section.min_wave_duration_secs
            )));
        }

        if section.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }

        info!(
            cities = target_set.len(),
            wave_width = wave_width.get(),
            min_wave_duration_secs = section.min_wave_duration_secs,
            "Collection configuration resolved"
        );

        Ok(Self {
            api_key,
            base_url: section.base_url.clone(),
            target_set: target_set.into(),
            wave_width,
            min_wave_duration: Duration::from_secs_f64(section.min_wave_duration_secs),
            request_timeout: Duration::from_secs(section.request_timeout_secs),
        })
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve the upstream API key from environment, then TOML
pub fn resolve_api_key(section: &CollectorSection) -> Result<String> {
    let env_key = std::env::var(API_KEY_ENV).ok().filter(|k| is_valid_key(k));
    let toml_key = section.api_key.clone().filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "API key found in both environment and TOML. Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!("API key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key {
        info!("API key loaded from TOML config");
        return Ok(key);
    }

    Err(Error::Config(format!(
        "Upstream API key not configured. Set {} or `api_key` in the [collector] table",
        API_KEY_ENV
    )))
}

/// Inline `target_set` followed by the ids of `target_set_file`
pub fn load_target_set(section: &CollectorSection) -> Result<Vec<i64>> {
    let mut target_set = section.target_set.clone();

    if let Some(path) = &section.target_set_file {
        target_set.extend(read_target_set_file(path)?);
    }

    if target_set.is_empty() {
        return Err(Error::Config(
            "Target set is empty: configure `target_set` or `target_set_file`".to_string(),
        ));
    }

    Ok(target_set)
}

fn read_target_set_file(path: &Path) -> Result<Vec<i64>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Read target set file failed ({}): {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Target set file {} must be a JSON array of city ids: {}",
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn section_with_key() -> CollectorSection {
        CollectorSection {
            api_key: Some("toml-key".to_string()),
            target_set: vec![1, 2, 3],
            ..Default::default()
        }
    }

    #[test]
    #[serial]
    fn test_resolves_defaults() {
        std::env::remove_var(API_KEY_ENV);
        let toml_config = TomlConfig {
            collector: section_with_key(),
            ..Default::default()
        };

        let config = CollectionConfig::from_toml(&toml_config).unwrap();
        assert_eq!(config.api_key, "toml-key");
        assert_eq!(&*config.target_set, &[1, 2, 3]);
        assert_eq!(config.wave_width.get(), 10);
        assert_eq!(config.min_wave_duration, Duration::from_secs(11));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn test_env_key_beats_toml() {
        std::env::set_var(API_KEY_ENV, "env-key");
        let key = resolve_api_key(&section_with_key());
        std::env::remove_var(API_KEY_ENV);
        assert_eq!(key.unwrap(), "env-key");
    }

    #[test]
    #[serial]
    fn test_missing_key_is_config_error() {
        std::env::remove_var(API_KEY_ENV);
        let section = CollectorSection {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(resolve_api_key(&section), Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn test_zero_wave_width_rejected() {
        std::env::remove_var(API_KEY_ENV);
        let toml_config = TomlConfig {
            collector: CollectorSection {
                wave_width: 0,
                ..section_with_key()
            },
            ..Default::default()
        };
        assert!(matches!(
            CollectionConfig::from_toml(&toml_config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_empty_target_set_rejected() {
        let section = CollectorSection::default();
        assert!(matches!(load_target_set(&section), Err(Error::Config(_))));
    }

    #[test]
    fn test_target_set_file_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cities.json");
        std::fs::write(&path, "[2643743, 2988507]").unwrap();

        let section = CollectorSection {
            target_set: vec![524901],
            target_set_file: Some(path),
            ..Default::default()
        };
        assert_eq!(
            load_target_set(&section).unwrap(),
            vec![524901, 2643743, 2988507]
        );
    }

    #[test]
    fn test_bad_target_set_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cities.json");
        std::fs::write(&path, "{\"not\": \"a list\"}").unwrap();

        let section = CollectorSection {
            target_set_file: Some(path),
            ..Default::default()
        };
        assert!(matches!(load_target_set(&section), Err(Error::Config(_))));
    }
}
