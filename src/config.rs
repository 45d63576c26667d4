use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::disambiguate::DisambiguationConfig;
use crate::export::ExportConfig;

/// Run configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub disambiguation: DisambiguationConfig,
    pub export: ExportConfig,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        if !(config.disambiguation.max_radius_km > 0.0) {
            anyhow::bail!("disambiguation.max_radius_km must be positive");
        }
        if !(config.disambiguation.similarity_divisor > 0.0) {
            anyhow::bail!("disambiguation.similarity_divisor must be positive");
        }
        if config.disambiguation.max_qualifiers == 0 {
            anyhow::bail!("disambiguation.max_qualifiers must be at least 1");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.disambiguation.max_radius_km, 20.0);
        assert_eq!(config.disambiguation.similarity_divisor, 4.0);
        assert_eq!(config.disambiguation.max_qualifiers, 3);
        assert_eq!(config.disambiguation.qualifier_prefix, "near");
        assert_eq!(config.export.feature_id_offset, 1_000_000_000);
        assert_eq!(config.export.country_code, "US");
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml(
            r#"
            [disambiguation]
            max_radius_km = 12.5

            [export]
            country_code = "CA"
            "#,
        )
        .unwrap();
        assert_eq!(config.disambiguation.max_radius_km, 12.5);
        assert_eq!(config.disambiguation.max_qualifiers, 3);
        assert_eq!(config.export.country_code, "CA");
        assert_eq!(config.export.name_type, "P");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_toml("[disambiguation]\nmax_radius_km = 0.0").is_err());
        assert!(Config::from_toml("[disambiguation]\nmax_qualifiers = 0").is_err());
        assert!(Config::from_toml("[disambiguation]\nsimilarity_divisor = -1.0").is_err());
        assert!(Config::from_toml("not toml at all [").is_err());
    }
}
