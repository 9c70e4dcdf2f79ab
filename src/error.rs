use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::migrate::MigrateError;
use thiserror::Error;
use uuid::Uuid;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Goal error: {0}")]
    Goal(#[from] GoalError),

    #[error("Escrow error: {0}")]
    Escrow(#[from] EscrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Goal-related errors
#[derive(Error, Debug)]
pub enum GoalError {
    #[error("Goal not found: {0}")]
    NotFound(Uuid),

    #[error("Goal is already settled: {0}")]
    TerminalState(Uuid),

    #[error("Stake must be positive, got {0}")]
    InvalidStake(String),

    #[error("Invalid deadline: {0}")]
    InvalidDeadline(String),
}

/// Escrow wallet errors. Per-transfer failures are not errors at this level;
/// they are typed outcomes collected by the payout executor.
#[derive(Error, Debug)]
pub enum EscrowError {
    #[error("Failed to read escrow balance: {0}")]
    BalanceUnavailable(String),

    #[error("Escrow signing key missing or malformed: {0}")]
    InvalidKey(String),
}

/// API error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            AppError::Goal(GoalError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                "GOAL_NOT_FOUND",
                format!("Goal not found: {}", id),
                None,
            ),
            AppError::Goal(GoalError::TerminalState(id)) => (
                StatusCode::CONFLICT,
                "GOAL_ALREADY_SETTLED",
                format!("Goal {} is in a terminal state and cannot change", id),
                None,
            ),
            AppError::Goal(GoalError::InvalidStake(stake)) => (
                StatusCode::BAD_REQUEST,
                "INVALID_STAKE",
                format!("Stake must be positive, got {}", stake),
                None,
            ),
            AppError::Goal(GoalError::InvalidDeadline(msg)) => (
                StatusCode::BAD_REQUEST,
                "INVALID_DEADLINE",
                msg,
                None,
            ),
            AppError::Escrow(EscrowError::BalanceUnavailable(msg)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "ESCROW_UNAVAILABLE",
                format!("Failed to read escrow balance: {}", msg),
                None,
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Not found: {}", what),
                None,
            ),
            AppError::InvalidInput(msg) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                msg,
                None,
            ),
            AppError::InvalidAddress(addr) => (
                StatusCode::BAD_REQUEST,
                "INVALID_ADDRESS",
                format!("Invalid wallet address: {}", addr),
                Some(serde_json::json!({ "address": addr })),
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "A database error occurred".to_string(),
                None,
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(format!("Error converting: {:?}", error))
    }
}

impl From<rust_decimal::Error> for AppError {
    fn from(error: rust_decimal::Error) -> Self {
        AppError::InvalidInput(format!("Decimal conversion error: {:?}", error))
    }
}

impl From<MigrateError> for AppError {
    fn from(error: MigrateError) -> Self {
        AppError::Internal(format!("Migration error: {:?}", error))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
