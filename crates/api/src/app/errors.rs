use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use myshop_core::{DomainError, ValidationErrors};
use myshop_infra::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by dashboard handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("unknown product type: {0}")]
    UnknownProductType(String),

    #[error("the product_type query parameter is required")]
    MissingProductType,
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Domain(DomainError::Invalid(errors))
    }
}

impl ApiError {
    /// Field-keyed errors, when this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ApiError::Domain(DomainError::Invalid(errors)) => Some(errors),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Store(err) => store_error_to_response(err),
            ApiError::UnknownProductType(product_type) => json_error(
                StatusCode::BAD_REQUEST,
                "unknown_product_type",
                format!("no detail serializer for product type {product_type:?}"),
            ),
            ApiError::MissingProductType => json_error(
                StatusCode::BAD_REQUEST,
                "missing_product_type",
                "the product_type query parameter is required",
            ),
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Invalid(errors) => validation_error(&errors),
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::NotFound(what) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
        }
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::ForeignKey(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_reference", msg),
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

/// 400 carrying the per-field errors under `fields`.
pub fn validation_error(errors: &ValidationErrors) -> Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "message": errors.to_string(),
            "fields": errors,
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
