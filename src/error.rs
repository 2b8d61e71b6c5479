use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::billing::{gate::AccessDenied, provider::ProviderError};

/// Where clients are sent when a paid-only action is refused.
pub const SUBSCRIPTION_PAGE: &str = "/api/v1/subscription";

const GENERIC_PROVIDER_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error(transparent)]
    PaymentRequired(#[from] AccessDenied),
    #[error("{0}")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'static str>,
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::PaymentRequired(_) => StatusCode::SEE_OTHER,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Provider(ProviderError::Rejected(_)) => StatusCode::BAD_REQUEST,
            Self::Provider(ProviderError::Unexpected(_)) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::PaymentRequired(_) => "PAID_MEMBERSHIP_REQUIRED",
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Provider(_) => "PAYMENT_PROVIDER_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Text shown to the user. Internal and unrecognized provider failures
    /// never leak their cause.
    pub fn public_message(&self) -> String {
        match self {
            Self::Provider(ProviderError::Unexpected(_)) => GENERIC_PROVIDER_MESSAGE.into(),
            Self::Internal(_) => "Internal server error".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(e) => error!(error = ?e, "internal error"),
            Self::Provider(e) => error!(error = %e, "payment provider error"),
            other => warn!(%status, error = %other, "request rejected"),
        }

        let body = ErrorBody {
            error: self.code(),
            message: self.public_message(),
            redirect: matches!(self, Self::PaymentRequired(_)).then_some(SUBSCRIPTION_PAGE),
        };

        if status == StatusCode::SEE_OTHER {
            return (status, [(header::LOCATION, SUBSCRIPTION_PAGE)], Json(body)).into_response();
        }
        (status, Json(body)).into_response()
    }
}

/// True when the error chain bottoms out in a unique-constraint violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<sqlx::Error>()
            .and_then(|e| e.as_database_error())
            .map(|db| db.is_unique_violation())
            .unwrap_or(false)
    })
}
