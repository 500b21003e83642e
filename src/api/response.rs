//! Response types for the payroll engine API.
//!
//! This module defines the error response structures and the mapping from
//! engine errors to HTTP statuses: validation failures are 400, missing
//! resources 404, state conflicts 409, and systemic faults 500.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{RunKey, RunSummary};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// Body of a successful `POST /payroll/preview`: the job handle to poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewAccepted {
    /// The job handle.
    pub job_id: Uuid,
    /// The run the job computes a preview for, rendered as its key string.
    pub run_key: String,
}

impl PreviewAccepted {
    /// Builds the acceptance body for a queued job.
    pub fn new(job_id: Uuid, key: &RunKey) -> Self {
        Self {
            job_id,
            run_key: key.to_string(),
        }
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        match error {
            // Definition errors: the structure payload is invalid.
            EngineError::DuplicateComponent { .. }
            | EngineError::InvalidComponentCode { .. }
            | EngineError::UnresolvedReference { .. }
            | EngineError::FormulaEvaluation { .. } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new("INVALID_STRUCTURE", error.to_string()),
            },
            EngineError::CyclicStructure { .. } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new("CYCLIC_STRUCTURE", error.to_string()),
            },

            // Per-employee inputs that surfaced synchronously.
            EngineError::NoActiveRuleSet { .. } | EngineError::MissingAttendance { .. } => {
                ApiErrorResponse {
                    status: StatusCode::BAD_REQUEST,
                    error: ApiError::new("VALIDATION_ERROR", error.to_string()),
                }
            }

            // Missing resources.
            EngineError::StructureNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("STRUCTURE_NOT_FOUND", error.to_string()),
            },
            EngineError::EmployeeNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("EMPLOYEE_NOT_FOUND", error.to_string()),
            },
            EngineError::RunNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("RUN_NOT_FOUND", error.to_string()),
            },
            EngineError::JobNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("JOB_NOT_FOUND", error.to_string()),
            },
            EngineError::ChallanNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("CHALLAN_NOT_FOUND", error.to_string()),
            },

            // State conflicts: rejected with no state change.
            EngineError::InvalidRunState { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("INVALID_RUN_STATE", error.to_string()),
            },
            EngineError::IncompletePreview { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("INCOMPLETE_PREVIEW", error.to_string()),
            },
            EngineError::AlreadyFinalized { ref summary, .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: already_finalized_error(&error.to_string(), summary),
            },
            EngineError::RunNotFinalized { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("RUN_NOT_FINALIZED", error.to_string()),
            },
            EngineError::ChallanLocked { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("CHALLAN_LOCKED", error.to_string()),
            },

            // Systemic and configuration faults.
            EngineError::Storage { .. } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::new("STORAGE_ERROR", error.to_string()),
            },
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParse { .. } => {
                ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::new("CONFIG_ERROR", error.to_string()),
                }
            }
        }
    }
}

/// The already-finalized conflict carries the existing run summary in the
/// details, so a repeat finalize call still receives the sealed result.
fn already_finalized_error(message: &str, summary: &RunSummary) -> ApiError {
    match serde_json::to_string(summary) {
        Ok(details) => ApiError::with_details("ALREADY_FINALIZED", message, details),
        Err(_) => ApiError::new("ALREADY_FINALIZED", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunType;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn summary() -> RunSummary {
        RunSummary {
            run_key: "acme/2024-04/regular".to_string(),
            period_month: 4,
            period_year: 2024,
            run_type: RunType::Regular,
            employee_count: 2,
            skipped_count: 0,
            total_gross: Decimal::from(60000),
            total_deductions: Decimal::from(3600),
            total_net: Decimal::from(56400),
            employer_cost: Decimal::from(63600),
            finalized_at: Utc::now(),
        }
    }

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details")); // Should be skipped when None
    }

    #[test]
    fn test_conflict_errors_map_to_409() {
        let error = EngineError::IncompletePreview { skipped: 2 };
        let response: ApiErrorResponse = error.into();
        assert_eq!(response.status, StatusCode::CONFLICT);
        assert_eq!(response.error.code, "INCOMPLETE_PREVIEW");

        let error = EngineError::ChallanLocked {
            challan_id: "ch_001".to_string(),
        };
        let response: ApiErrorResponse = error.into();
        assert_eq!(response.status, StatusCode::CONFLICT);
        assert_eq!(response.error.code, "CHALLAN_LOCKED");
    }

    #[test]
    fn test_already_finalized_carries_summary_in_details() {
        let error = EngineError::AlreadyFinalized {
            key: "acme/2024-04/regular".to_string(),
            summary: Box::new(summary()),
        };
        let response: ApiErrorResponse = error.into();
        assert_eq!(response.status, StatusCode::CONFLICT);
        let details = response.error.details.unwrap();
        assert!(details.contains("\"employee_count\":2"));
    }

    #[test]
    fn test_not_found_errors_map_to_404() {
        let error = EngineError::RunNotFound {
            key: "acme/2024-04/regular".to_string(),
        };
        let response: ApiErrorResponse = error.into();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.error.code, "RUN_NOT_FOUND");
    }

    #[test]
    fn test_definition_errors_map_to_400() {
        let error = EngineError::CyclicStructure {
            structure: "STD".to_string(),
            cycle: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        };
        let response: ApiErrorResponse = error.into();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.code, "CYCLIC_STRUCTURE");
    }
}
