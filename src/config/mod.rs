//! Statutory rule configuration for the payroll calculation engine.
//!
//! This module provides functionality to load externally supplied PF, ESI,
//! and professional-tax parameters from YAML files. The engine applies
//! these rules but does not define them.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/statutory/statutory.yaml").unwrap();
//! println!("Loaded rules: {}", loader.config().metadata.name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{EsiRule, PfRule, PtSlab, RuleSetMetadata, StatutoryConfig};
