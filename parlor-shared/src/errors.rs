use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{domain}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Wallet errors
/// - E2xxx: Matching/profile errors
/// - E3xxx: Game errors
/// - E4xxx: Shop errors
/// - E5xxx: Gift-draw errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    BadRequest,
    FeatureDisabled,
    Forbidden,

    // Wallet (E1xxx)
    InsufficientFunds,

    // Matching (E2xxx)
    ProfileNotFound,
    UserNotFound,

    // Game (E3xxx)
    EmptyDeck,
    NoActiveRound,
    RoundAlreadyActive,
    DoubleNotAllowed,
    InvalidBet,

    // Shop (E4xxx)
    ItemNotFound,
    PurchaseNotFound,
    NotGiftRecipient,

    // Gift draw (E5xxx)
    DrawClosed,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::BadRequest => "E0004",
            Self::FeatureDisabled => "E0005",
            Self::Forbidden => "E0006",

            // Wallet
            Self::InsufficientFunds => "E1001",

            // Matching
            Self::ProfileNotFound => "E2001",
            Self::UserNotFound => "E2002",

            // Game
            Self::EmptyDeck => "E3001",
            Self::NoActiveRound => "E3002",
            Self::RoundAlreadyActive => "E3003",
            Self::DoubleNotAllowed => "E3004",
            Self::InvalidBet => "E3005",

            // Shop
            Self::ItemNotFound => "E4001",
            Self::PurchaseNotFound => "E4002",
            Self::NotGiftRecipient => "E4003",

            // Gift draw
            Self::DrawClosed => "E5001",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::InvalidBet
            | Self::DoubleNotAllowed => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::ProfileNotFound | Self::UserNotFound
            | Self::ItemNotFound | Self::PurchaseNotFound | Self::NoActiveRound => {
                StatusCode::NOT_FOUND
            }
            Self::Forbidden | Self::NotGiftRecipient => StatusCode::FORBIDDEN,
            Self::FeatureDisabled | Self::DrawClosed => StatusCode::SERVICE_UNAVAILABLE,
            Self::InsufficientFunds | Self::RoundAlreadyActive => StatusCode::CONFLICT,
            Self::EmptyDeck => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the user can simply retry the same step after this error.
    /// Drives the dispatch layer's choice between a re-prompt and a reset.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationError | Self::BadRequest | Self::InvalidBet | Self::InsufficientFunds
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known { code: ErrorCode, message: String },

    #[error("internal error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn insufficient_funds(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InsufficientFunds, message)
    }

    pub fn feature_disabled(feature: &str) -> Self {
        Self::new(ErrorCode::FeatureDisabled, format!("{feature} is disabled"))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Known { code, .. } => *code,
            Self::Internal(_) => ErrorCode::InternalError,
            Self::Database(diesel::result::Error::NotFound) => ErrorCode::NotFound,
            Self::Database(_) => ErrorCode::InternalError,
            Self::Validation(_) => ErrorCode::ValidationError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message } => {
                (code.status_code(), ApiErrorResponse::new(code.code(), message))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
