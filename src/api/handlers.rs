//! HTTP request handlers for the payroll engine API.
//!
//! This module contains the handler functions for all API endpoints.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use uuid::Uuid;

use super::request::{ChallanRequest, FinalizeRequest, MarkPaidRequest, PreviewRequest};
use super::response::{ApiError, ApiErrorResponse, PreviewAccepted};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/payroll/preview", post(start_preview_handler))
        .route("/payroll/preview/:job_id", get(poll_preview_handler))
        .route("/payroll/finalize", post(finalize_handler))
        .route("/payroll/challans", post(generate_challan_handler))
        .route("/payroll/challans/:challan_id", get(get_challan_handler))
        .route("/payroll/challans/:challan_id/pay", post(mark_paid_handler))
        .with_state(state)
}

/// Handler for POST /payroll/preview.
///
/// Queues a preview batch for the run and returns the job handle to poll.
/// A repeat request supersedes the previous preview.
async fn start_preview_handler(
    State(state): State<AppState>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let key = request.run.run_key();
    info!(correlation_id = %correlation_id, run_key = %key, "Preview requested");

    match state.orchestrator().start_preview(key.clone()) {
        Ok(job_id) => json_response(StatusCode::ACCEPTED, &PreviewAccepted::new(job_id, &key)),
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Preview request rejected");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for GET /payroll/preview/{job_id}.
///
/// Reports the job's phase and progress, plus the snapshot once completed.
async fn poll_preview_handler(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Response {
    match state.orchestrator().get_preview(job_id) {
        Ok(poll) => json_response(StatusCode::OK, &poll),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for POST /payroll/finalize.
///
/// Seals a ready run into immutable payslips and returns the run summary.
async fn finalize_handler(
    State(state): State<AppState>,
    payload: Result<Json<FinalizeRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let key = request.run.run_key();
    info!(
        correlation_id = %correlation_id,
        run_key = %key,
        override_skips = request.override_skips,
        "Finalize requested"
    );

    match state.orchestrator().finalize(&key, request.override_skips) {
        Ok(summary) => json_response(StatusCode::OK, &summary),
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Finalize rejected");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for POST /payroll/challans.
///
/// Generates (or regenerates) the challan for one statutory scheme from a
/// finalized run's payslips.
async fn generate_challan_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChallanRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let key = request.run.run_key();
    info!(
        correlation_id = %correlation_id,
        run_key = %key,
        scheme = request.statutory_type.code(),
        "Challan generation requested"
    );

    let payslips = match state.orchestrator().payslips(&key) {
        Ok(payslips) => payslips,
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Challan generation rejected");
            return ApiErrorResponse::from(err).into_response();
        }
    };

    match state
        .challans()
        .generate(&key.to_string(), request.statutory_type, &payslips)
    {
        Ok(challan) => json_response(StatusCode::OK, &challan),
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Challan generation rejected");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for GET /payroll/challans/{challan_id}.
async fn get_challan_handler(
    State(state): State<AppState>,
    Path(challan_id): Path<Uuid>,
) -> Response {
    match state.challans().get(challan_id) {
        Ok(challan) => json_response(StatusCode::OK, &challan),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for POST /payroll/challans/{challan_id}/pay.
///
/// Marks a draft challan paid; one-way.
async fn mark_paid_handler(
    State(state): State<AppState>,
    Path(challan_id): Path<Uuid>,
    payload: Result<Json<MarkPaidRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match state.challans().mark_paid(challan_id, &request.payment_ref) {
        Ok(challan) => json_response(StatusCode::OK, &challan),
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Mark paid rejected");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Turns a JSON extraction result into the request type or an error
/// response describing what was wrong with the body.
fn parse_json<T: DeserializeOwned>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, Response> {
    match payload {
        Ok(Json(request)) => Ok(request),
        Err(rejection) => {
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
            Err((StatusCode::BAD_REQUEST, Json(error)).into_response())
        }
    }
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PfRule, RuleSetStore, StatutoryRuleSet};
    use crate::models::{
        Challan, Component, ComponentKind, EmployeeProfile, EmployeeStatus, PeriodAttendance,
        RunSummary, SalaryStructure, ValueType,
    };
    use crate::ports::{InMemoryAttendance, InMemoryDirectory, InMemoryStructures};
    use crate::run::{JobPhase, PayrollOrchestrator, PreviewPoll};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_router() -> Router {
        let directory = InMemoryDirectory::new();
        let attendance = InMemoryAttendance::new();
        for id in ["emp_001", "emp_002"] {
            directory.upsert(
                "acme",
                EmployeeProfile {
                    id: id.to_string(),
                    display_name: format!("Employee {}", id),
                    annual_ctc: dec("600000"),
                    structure_code: Some("STD".to_string()),
                    join_date: date(2022, 6, 1),
                    status: EmployeeStatus::Active,
                    esi_exempt: false,
                },
            );
            attendance.record(
                id,
                4,
                2024,
                PeriodAttendance {
                    present_days: dec("22"),
                    paid_leave_days: dec("0"),
                    total_working_days: dec("22"),
                },
            );
        }

        let structures = InMemoryStructures::new();
        structures
            .save(
                SalaryStructure {
                    code: "STD".to_string(),
                    version: 1,
                    is_active: true,
                    components: vec![Component {
                        code: "BASIC".to_string(),
                        label: "Basic Salary".to_string(),
                        kind: ComponentKind::Earning,
                        value: ValueType::PercentageOf {
                            reference: "CTC".to_string(),
                            percent: dec("40"),
                        },
                        taxable: true,
                        prorated: true,
                        sequence: 1,
                    }],
                },
                date(2023, 4, 1),
            )
            .unwrap();

        let rules = RuleSetStore::new(vec![StatutoryRuleSet {
            version: "v2024_04".to_string(),
            name: "FY 2024-25".to_string(),
            effective_from: date(2024, 4, 1),
            pf: Some(PfRule {
                employee_percent: dec("12"),
                employer_percent: dec("12"),
                wage_ceiling: dec("15000"),
            }),
            esi: None,
            pt: None,
        }]);

        let orchestrator = Arc::new(PayrollOrchestrator::new(
            Arc::new(directory),
            Arc::new(attendance),
            Arc::new(structures),
            Arc::new(rules),
        ));
        create_router(AppState::new(orchestrator))
    }

    async fn post_json(router: &Router, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn get_uri(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    const RUN_BODY: &str = r#"{"tenant_id": "acme", "period_month": 4, "period_year": 2024}"#;

    async fn run_preview_to_completion(router: &Router) -> PreviewPoll {
        let (status, body) = post_json(router, "/payroll/preview", RUN_BODY).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let accepted: PreviewAccepted = serde_json::from_slice(&body).unwrap();

        for _ in 0..200 {
            let uri = format!("/payroll/preview/{}", accepted.job_id);
            let (status, body) = get_uri(router, &uri).await;
            assert_eq!(status, StatusCode::OK);
            let poll: PreviewPoll = serde_json::from_slice(&body).unwrap();
            if matches!(poll.phase, JobPhase::Completed | JobPhase::Failed) {
                return poll;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("preview did not complete");
    }

    #[tokio::test]
    async fn test_api_001_preview_finalize_flow() {
        let router = test_router();

        let poll = run_preview_to_completion(&router).await;
        assert_eq!(poll.phase, JobPhase::Completed);
        let snapshot = poll.snapshot.unwrap();
        assert_eq!(snapshot.summary.employees, 2);
        // Two employees at BASIC = 40% of 50000 monthly CTC.
        assert_eq!(snapshot.summary.total_gross, dec("40000.00"));

        let (status, body) = post_json(&router, "/payroll/finalize", RUN_BODY).await;
        assert_eq!(status, StatusCode::OK);
        let summary: RunSummary = serde_json::from_slice(&body).unwrap();
        assert_eq!(summary.employee_count, 2);
        assert_eq!(summary.total_gross, dec("40000.00"));
    }

    #[tokio::test]
    async fn test_api_002_malformed_json_returns_400() {
        let router = test_router();
        let (status, body) = post_json(&router, "/payroll/preview", "{invalid json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_api_003_missing_field_returns_400() {
        let router = test_router();
        let (status, body) =
            post_json(&router, "/payroll/preview", r#"{"tenant_id": "acme"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert!(
            error.message.contains("missing field"),
            "Expected missing field message, got: {}",
            error.message
        );
    }

    #[tokio::test]
    async fn test_api_004_unknown_job_returns_404() {
        let router = test_router();
        let uri = format!("/payroll/preview/{}", Uuid::new_v4());
        let (status, body) = get_uri(&router, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "JOB_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_api_005_finalize_before_ready_returns_409() {
        let router = test_router();
        let (status, _) = post_json(&router, "/payroll/preview", RUN_BODY).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, body) = post_json(&router, "/payroll/finalize", RUN_BODY).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "INVALID_RUN_STATE");
    }

    #[tokio::test]
    async fn test_api_006_repeat_finalize_returns_409_with_summary() {
        let router = test_router();
        run_preview_to_completion(&router).await;

        let (status, _) = post_json(&router, "/payroll/finalize", RUN_BODY).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post_json(&router, "/payroll/finalize", RUN_BODY).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "ALREADY_FINALIZED");
        let details: RunSummary = serde_json::from_str(&error.details.unwrap()).unwrap();
        assert_eq!(details.employee_count, 2);
    }

    #[tokio::test]
    async fn test_api_007_challan_lifecycle() {
        let router = test_router();
        run_preview_to_completion(&router).await;
        post_json(&router, "/payroll/finalize", RUN_BODY).await;

        let challan_body = r#"{
            "tenant_id": "acme",
            "period_month": 4,
            "period_year": 2024,
            "statutory_type": "pf"
        }"#;
        let (status, body) = post_json(&router, "/payroll/challans", challan_body).await;
        assert_eq!(status, StatusCode::OK);
        let challan: Challan = serde_json::from_slice(&body).unwrap();
        // 12% of min(20000, 15000) per employee.
        assert_eq!(challan.employee_share, dec("3600.00"));
        assert_eq!(challan.lines.len(), 2);

        let pay_uri = format!("/payroll/challans/{}/pay", challan.id);
        let (status, body) = post_json(&router, &pay_uri, r#"{"payment_ref": "TXN-1"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let paid: Challan = serde_json::from_slice(&body).unwrap();
        assert_eq!(paid.payment_ref.as_deref(), Some("TXN-1"));

        // Regeneration after payment is a conflict.
        let (status, body) = post_json(&router, "/payroll/challans", challan_body).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "CHALLAN_LOCKED");

        // The record is unchanged.
        let (status, body) = get_uri(&router, &format!("/payroll/challans/{}", challan.id)).await;
        assert_eq!(status, StatusCode::OK);
        let fetched: Challan = serde_json::from_slice(&body).unwrap();
        assert_eq!(fetched, paid);
    }

    #[tokio::test]
    async fn test_api_008_challan_requires_finalized_run() {
        let router = test_router();
        run_preview_to_completion(&router).await;

        let challan_body = r#"{
            "tenant_id": "acme",
            "period_month": 4,
            "period_year": 2024,
            "statutory_type": "pf"
        }"#;
        let (status, body) = post_json(&router, "/payroll/challans", challan_body).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "RUN_NOT_FINALIZED");
    }
}
