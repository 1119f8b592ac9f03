//! Error types for the payroll calculation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while managing the component
//! catalog, resolving salary structures, and driving the pay-run lifecycle.

use thiserror::Error;
use uuid::Uuid;

/// The main error type for the payroll calculation engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::ComponentNotFound {
///     code: "HRA".to_string(),
/// };
/// assert_eq!(error.to_string(), "Component not found: HRA");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// A component definition or assignment failed validation.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The field or attribute that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// The dependency graph between components contains a cycle.
    ///
    /// The path names every component on the cycle, in dependency order,
    /// with the starting component repeated at the end.
    #[error("Dependency cycle detected: {}", path.join(" -> "))]
    Cycle {
        /// The component codes forming the cycle.
        path: Vec<String>,
    },

    /// A percentage base or formula variable points to a component that
    /// does not exist or is inactive.
    #[error("Unresolved reference to '{code}' from component '{referenced_by}'")]
    UnresolvedReference {
        /// The code that could not be resolved.
        code: String,
        /// The component whose definition referenced it.
        referenced_by: String,
    },

    /// A mandatory (statutory) component has no active assignment for the
    /// employee being evaluated.
    #[error(
        "Missing assignment for statutory component '{component}' on employee '{employee_id}'"
    )]
    MissingAssignment {
        /// The statutory component code.
        component: String,
        /// The employee lacking the assignment.
        employee_id: String,
    },

    /// Evaluating a component's amount failed (malformed formula, division
    /// by zero, or similar). Recorded per employee, never aborts the batch.
    #[error("Evaluation of component '{component}' failed: {message}")]
    Evaluation {
        /// The component whose evaluation failed.
        component: String,
        /// A description of the failure.
        message: String,
    },

    /// An operation was attempted from a pay-run status that never permits it.
    #[error("Cannot {action} a pay run in status {status}")]
    IllegalState {
        /// The attempted action (e.g. "approve", "cancel").
        action: String,
        /// The pay run's current status.
        status: String,
    },

    /// A compare-and-swap on the pay-run status failed because another
    /// transition won the race.
    #[error("Concurrent transition conflict: expected status {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The status the caller expected to transition from.
        expected: String,
        /// The status actually observed.
        actual: String,
    },

    /// Approval was rejected because one or more employee lines are flagged
    /// in error.
    #[error("Cannot approve pay run: {count} employee line(s) flagged in error")]
    ApprovalBlocked {
        /// The number of flagged lines.
        count: usize,
    },

    /// No component with the given code exists in the catalog.
    #[error("Component not found: {code}")]
    ComponentNotFound {
        /// The missing component code.
        code: String,
    },

    /// No pay run with the given id exists.
    #[error("Pay run not found: {id}")]
    PayRunNotFound {
        /// The missing pay-run id.
        id: Uuid,
    },

    /// A component cannot be deactivated while an active assignment
    /// references it.
    #[error("Component '{code}' is referenced by an active assignment")]
    ReferencedByActiveAssignment {
        /// The component code.
        code: String,
    },

    /// A component cannot be deactivated while another active component
    /// depends on it.
    #[error("Component '{code}' is referenced by dependent component '{dependent}'")]
    ReferencedByDependentComponent {
        /// The component code.
        code: String,
        /// The component that depends on it.
        dependent: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParse {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_displays_field_and_message() {
        let error = EngineError::Validation {
            field: "code".to_string(),
            message: "must match [A-Z_]+".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Validation failed for 'code': must match [A-Z_]+"
        );
    }

    #[test]
    fn test_cycle_displays_full_path() {
        let error = EngineError::Cycle {
            path: vec!["HRA".to_string(), "BASIC".to_string(), "HRA".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Dependency cycle detected: HRA -> BASIC -> HRA"
        );
    }

    #[test]
    fn test_unresolved_reference_displays_both_codes() {
        let error = EngineError::UnresolvedReference {
            code: "SPECIAL".to_string(),
            referenced_by: "BONUS".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unresolved reference to 'SPECIAL' from component 'BONUS'"
        );
    }

    #[test]
    fn test_missing_assignment_displays_component_and_employee() {
        let error = EngineError::MissingAssignment {
            component: "PF".to_string(),
            employee_id: "emp_001".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Missing assignment for statutory component 'PF' on employee 'emp_001'"
        );
    }

    #[test]
    fn test_evaluation_displays_component_and_message() {
        let error = EngineError::Evaluation {
            component: "BONUS".to_string(),
            message: "division by zero".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Evaluation of component 'BONUS' failed: division by zero"
        );
    }

    #[test]
    fn test_illegal_state_displays_action_and_status() {
        let error = EngineError::IllegalState {
            action: "cancel".to_string(),
            status: "approved".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Cannot cancel a pay run in status approved"
        );
    }

    #[test]
    fn test_concurrency_conflict_displays_statuses() {
        let error = EngineError::ConcurrencyConflict {
            expected: "draft".to_string(),
            actual: "cancelled".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Concurrent transition conflict: expected status draft, found cancelled"
        );
    }

    #[test]
    fn test_approval_blocked_displays_count() {
        let error = EngineError::ApprovalBlocked { count: 2 };
        assert_eq!(
            error.to_string(),
            "Cannot approve pay run: 2 employee line(s) flagged in error"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_component_not_found() -> EngineResult<()> {
            Err(EngineError::ComponentNotFound {
                code: "HRA".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_component_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
