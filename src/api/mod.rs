//! HTTP API module for the payroll engine.
//!
//! This module provides the REST endpoints for managing the component
//! catalog, employee assignments, and the pay-run lifecycle.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{AssignmentRequest, CalculateRequest, CreatePayRunRequest};
pub use response::ApiError;
pub use state::AppState;
