//! HTTP request handlers for the payroll engine API.
//!
//! This module contains the handler functions for all API endpoints.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::ComponentDraft;
use crate::models::{AttendanceReport, EmployeeProfile, PayPeriod};

use super::request::{AssignmentRequest, CalculateRequest, CreatePayRunRequest};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/components", post(define_component_handler))
        .route(
            "/components/:code/deactivate",
            post(deactivate_component_handler),
        )
        .route("/employees/:id/assignments", post(assign_handler))
        .route(
            "/employees/:id/assignments/:code",
            delete(remove_assignment_handler),
        )
        .route("/pay-runs", post(create_pay_run_handler))
        .route(
            "/pay-runs/:id",
            get(get_pay_run_handler).delete(delete_pay_run_handler),
        )
        .route("/pay-runs/:id/calculate", post(calculate_handler))
        .route("/pay-runs/:id/approve", post(approve_handler))
        .route("/pay-runs/:id/complete", post(complete_handler))
        .route("/pay-runs/:id/cancel", post(cancel_handler))
        .route(
            "/pay-runs/:id/payslips",
            post(generate_payslips_handler).get(get_payslips_handler),
        )
        .with_state(state)
}

/// Turns a JSON extraction rejection into an error response.
fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(correlation_id = %correlation_id, error = %body_text, "JSON data error");
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "JSON syntax error");
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => ApiError::new(
            "MISSING_CONTENT_TYPE",
            "Content-Type must be application/json",
        ),
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    (StatusCode::BAD_REQUEST, Json(error)).into_response()
}

/// Handler for POST /components.
///
/// Defines a new salary component in the catalog.
async fn define_component_handler(
    State(state): State<AppState>,
    payload: Result<Json<ComponentDraft>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let draft = match payload {
        Ok(Json(draft)) => draft,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };
    let code = draft.code.clone();

    let mut catalog = state.catalog().write().await;
    match catalog.define_component(draft) {
        Ok(_) => {
            info!(correlation_id = %correlation_id, code = %code, "component defined");
            let definition = catalog.component(&code).cloned();
            (StatusCode::CREATED, Json(definition)).into_response()
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, code = %code, error = %err, "component definition rejected");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for POST /components/{code}/deactivate.
async fn deactivate_component_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let mut catalog = state.catalog().write().await;
    match catalog.deactivate_component(&code) {
        Ok(()) => {
            info!(correlation_id = %correlation_id, code = %code, "component deactivated");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, code = %code, error = %err, "deactivation rejected");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for POST /employees/{id}/assignments.
async fn assign_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    payload: Result<Json<AssignmentRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let draft = match payload {
        Ok(Json(draft)) => draft,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };
    let code = draft.component_code.clone();

    let mut catalog = state.catalog().write().await;
    match catalog.assign(&employee_id, draft) {
        Ok(()) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %employee_id,
                code = %code,
                "component assigned"
            );
            StatusCode::CREATED.into_response()
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, employee_id = %employee_id, error = %err, "assignment rejected");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for DELETE /employees/{id}/assignments/{code}.
async fn remove_assignment_handler(
    State(state): State<AppState>,
    Path((employee_id, code)): Path<(String, String)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let mut catalog = state.catalog().write().await;
    match catalog.remove_assignment(&employee_id, &code) {
        Ok(()) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %employee_id,
                code = %code,
                "assignment removed"
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for POST /pay-runs.
async fn create_pay_run_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreatePayRunRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let pay_period: PayPeriod = request.pay_period.into();
    let employees: Vec<EmployeeProfile> =
        request.employees.into_iter().map(Into::into).collect();
    let run = state.pay_runs().create(pay_period, employees).await;
    info!(correlation_id = %correlation_id, pay_run_id = %run.id, "pay run created");
    (StatusCode::CREATED, Json(run)).into_response()
}

/// Handler for GET /pay-runs/{id}.
async fn get_pay_run_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.pay_runs().get(id).await {
        Ok(run) => Json(run).into_response(),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for DELETE /pay-runs/{id}.
async fn delete_pay_run_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.pay_runs().delete(id).await {
        Ok(()) => {
            info!(correlation_id = %correlation_id, pay_run_id = %id, "pay run deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, pay_run_id = %id, error = %err, "delete rejected");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for POST /pay-runs/{id}/calculate.
///
/// Takes the attendance report in the body and recalculates every
/// employee line against a snapshot of the current salary structure.
async fn calculate_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };
    let attendance: AttendanceReport = request.into();

    let snapshot = state.catalog().read().await.snapshot();
    let statutory = state.config().config().clone();
    match state
        .pay_runs()
        .calculate(id, attendance, snapshot, statutory)
        .await
    {
        Ok(run) => {
            info!(
                correlation_id = %correlation_id,
                pay_run_id = %id,
                employees = run.totals.employee_count,
                flagged = run.flagged_line_count(),
                gross = %run.totals.total_gross_pay,
                "calculation completed"
            );
            Json(run).into_response()
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, pay_run_id = %id, error = %err, "calculation rejected");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for POST /pay-runs/{id}/approve.
async fn approve_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.pay_runs().approve(id).await {
        Ok(run) => Json(run).into_response(),
        Err(err) => {
            warn!(correlation_id = %correlation_id, pay_run_id = %id, error = %err, "approval rejected");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for POST /pay-runs/{id}/complete.
async fn complete_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.pay_runs().complete(id).await {
        Ok(run) => Json(run).into_response(),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for POST /pay-runs/{id}/cancel.
async fn cancel_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.pay_runs().cancel(id).await {
        Ok(run) => Json(run).into_response(),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for POST /pay-runs/{id}/payslips.
async fn generate_payslips_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.pay_runs().generate_payslips(id).await {
        Ok(slips) => {
            info!(correlation_id = %correlation_id, pay_run_id = %id, payslips = slips.len(), "payslips generated");
            (StatusCode::CREATED, Json(slips)).into_response()
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, pay_run_id = %id, error = %err, "payslip generation rejected");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for GET /pay-runs/{id}/payslips.
async fn get_payslips_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.pay_runs().payslips(id).await {
        Ok(slips) => Json(slips).into_response(),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}
