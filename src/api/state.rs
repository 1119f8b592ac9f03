//! Application state for the payroll engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::catalog::ComponentCatalog;
use crate::config::ConfigLoader;
use crate::payrun::PayRunManager;

/// Shared application state.
///
/// The catalog sits behind a lock because definition and assignment
/// endpoints mutate it; the statutory configuration is immutable after
/// startup and the pay-run manager does its own locking.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
    catalog: Arc<RwLock<ComponentCatalog>>,
    pay_runs: Arc<PayRunManager>,
}

impl AppState {
    /// Creates a new application state with the given configuration loader.
    pub fn new(config: ConfigLoader) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::new(RwLock::new(ComponentCatalog::new())),
            pay_runs: Arc::new(PayRunManager::new()),
        }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns the shared component catalog.
    pub fn catalog(&self) -> &RwLock<ComponentCatalog> {
        &self.catalog
    }

    /// Returns the pay-run manager.
    pub fn pay_runs(&self) -> &PayRunManager {
        &self.pay_runs
    }
}
