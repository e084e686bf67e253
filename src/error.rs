use crate::bidding::commands::{BidRejection, CommandError};
use crate::report::ReportError;
use crate::store::StoreError;
use crate::winners::FilterError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Error type of the HTTP handlers, rendered as `{"error": ..., "code": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

pub type AppResult<T> = Result<T, AppError>;

type Classified = (StatusCode, &'static str, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Store(err) => classify_store_error(err),
            AppError::Command(err) => match err {
                CommandError::Rejected(rejection) => classify_rejection(rejection),
                CommandError::Invalid(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CommandError::Store(err) => classify_store_error(err),
            },
            AppError::Report(err) => match err {
                ReportError::Store(err) => classify_store_error(err),
                other => internal(other),
            },
            AppError::Filter(err) => (StatusCode::BAD_REQUEST, "INVALID_FILTER", err.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_rejection(rejection: &BidRejection) -> Classified {
    let status = match rejection {
        BidRejection::DuplicateBid => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, rejection.code(), rejection.to_string())
}

/// - `NotFound` maps to 404.
/// - Unique violations map to 409, other constraint violations to 400.
/// - Everything else maps to 500 with a sanitized message.
fn classify_store_error(err: &StoreError) -> Classified {
    match err {
        StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
        StoreError::Conflict(constraint) => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
        ),
        StoreError::Constraint(constraint) => (
            StatusCode::BAD_REQUEST,
            "CONSTRAINT_VIOLATION",
            format!("Value violates constraint: {constraint}"),
        ),
        StoreError::Database(_) => internal(err),
    }
}

fn internal(err: &dyn std::error::Error) -> Classified {
    tracing::error!(error = %err, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::TagError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_of(StoreError::not_found("event", 1).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(StoreError::Conflict("uq_bidders_email".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CommandError::from(BidRejection::DuplicateBid).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CommandError::from(BidRejection::NotStarted).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(FilterError::ConflictingFilters.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::BadRequest("expected a boolean".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Forbidden("winners not released".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(ReportError::Tag(TagError::UnknownCategory(3)).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
