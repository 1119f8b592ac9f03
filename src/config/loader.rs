//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading statutory
//! deduction rules from a YAML file.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::StatutoryConfig;

/// Loads and provides access to the statutory rule configuration.
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/statutory/statutory.yaml").unwrap();
/// println!("Loaded rules: {}", loader.config().metadata.name);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: StatutoryConfig,
}

impl ConfigLoader {
    /// Loads statutory rules from the specified YAML file.
    ///
    /// # Errors
    ///
    /// * [`EngineError::ConfigNotFound`] when the file does not exist.
    /// * [`EngineError::ConfigParse`] when the YAML is invalid or a
    ///   required field is missing.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let config = Self::load_yaml(path.as_ref())?;
        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParse {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the loaded statutory configuration.
    pub fn config(&self) -> &StatutoryConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config/statutory/statutory.yaml"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.config().metadata.name, "India statutory deductions");
    }

    #[test]
    fn test_pf_rule_loaded_correctly() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let pf = loader.config().pf.as_ref().unwrap();
        assert_eq!(pf.employee_rate, dec("12"));
        assert_eq!(pf.wage_ceiling, Some(dec("15000")));
        assert_eq!(pf.wage_base_components, vec!["BASIC".to_string()]);
    }

    #[test]
    fn test_esi_rule_loaded_correctly() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let esi = loader.config().esi.as_ref().unwrap();
        assert_eq!(esi.employee_rate, dec("0.75"));
        assert_eq!(esi.gross_threshold, dec("21000"));
    }

    #[test]
    fn test_professional_tax_slabs_loaded_in_order() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let slabs = &loader.config().professional_tax;
        assert_eq!(slabs.len(), 3);
        assert_eq!(slabs[0].amount, dec("0"));
        assert_eq!(slabs[1].amount, dec("150"));
        assert!(slabs[2].up_to.is_none());
    }

    #[test]
    fn test_load_missing_file_returns_error() {
        let result = ConfigLoader::load("/nonexistent/statutory.yaml");
        assert!(result.is_err());

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("statutory.yaml"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }
}
