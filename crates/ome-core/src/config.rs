//! Engine configuration.
//!
//! Configuration is read from a TOML file once at startup. A missing section
//! falls back to its defaults; an invalid value refuses to start the engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::{default_table, ConversionTable, TableResult};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Engine configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub safety: SafetyConfig,

    #[serde(default)]
    pub table: TableConfig,
}

/// Cross-tolerance reduction settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SafetyConfig {
    /// Fraction of the calculated dose retained on a drug switch when the
    /// reference data has no per-pair override
    #[serde(default = "default_retained_fraction")]
    pub default_retained_fraction: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            default_retained_fraction: default_retained_fraction(),
        }
    }
}

/// Reference table source
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct TableConfig {
    /// Dataset file to use instead of the bundled table
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_retained_fraction() -> f64 {
    0.5
}

impl EngineConfig {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        let fraction = self.safety.default_retained_fraction;
        if !(fraction.is_finite() && fraction > 0.0 && fraction < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "safety.default_retained_fraction must be in (0, 1), got {}",
                fraction
            )));
        }
        Ok(())
    }

    /// The configured reference table: the dataset at `table.path`, or the
    /// shared bundled table.
    pub fn load_table(&self) -> TableResult<Arc<ConversionTable>> {
        match &self.table.path {
            Some(path) => ConversionTable::load(path).map(Arc::new),
            None => default_table(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.safety.default_retained_fraction, 0.5);
        assert!(config.table.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[safety]
default_retained_fraction = 0.75
"#;
        let config = EngineConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.safety.default_retained_fraction, 0.75);
        assert!(config.table.path.is_none()); // default
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_out_of_range_fraction_is_rejected() {
        for value in ["0.0", "1.0", "1.5", "-0.25"] {
            let toml_str = format!("[safety]\ndefault_retained_fraction = {}\n", value);
            assert!(
                matches!(EngineConfig::from_toml_str(&toml_str), Err(ConfigError::Invalid(_))),
                "accepted {}",
                value
            );
        }
    }

    #[test]
    fn test_config_roundtrip() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = EngineConfig::from_toml_str(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }

    #[test]
    fn test_load_from_file_with_table_path() {
        let dir = tempfile::tempdir().unwrap();

        let table_path = dir.path().join("table.json");
        std::fs::write(
            &table_path,
            r#"{"entries":[{"drug":"morphine","route":"po","unit":"mg","potency_factor":1.0,"rounding_increment":1.0}]}"#,
        )
        .unwrap();

        let config_path = dir.path().join("engine.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "[table]\npath = {:?}", table_path.to_string_lossy()).unwrap();

        let config = EngineConfig::load_from(&config_path).unwrap();
        let table = config.load_table().unwrap();

        assert_eq!(table.len(), 1);
        assert!(table.contains_drug("morphine"));
    }

    #[test]
    fn test_missing_table_file_is_fatal() {
        let config = EngineConfig {
            table: TableConfig {
                path: Some(PathBuf::from("/nonexistent/table.json")),
            },
            ..EngineConfig::default()
        };

        assert!(config.load_table().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let result = EngineConfig::load_from(Path::new("/nonexistent/engine.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
