use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("A payment for this action is already being processed")]
    PaymentInProgress,

    #[error("Payment {0} has already been redeemed")]
    PaymentAlreadyRedeemed(String),

    #[error("Continuation payment required for room {0}")]
    ContinuationRequired(String),

    #[error("Continuation payment not required for room {0}")]
    ContinuationNotRequired(String),

    #[error("A turn is already being generated for room {0}")]
    TurnInProgress(String),

    #[error("Continuation payment already in progress for room {0}")]
    ContinuationInProgress(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Rate limit exceeded")]
    RateLimited,

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

/// Payment errors surfaced to the caller.
///
/// These are mutually exclusive tags; presentation layers translate them
/// through [`PaymentError::code`], never through the message text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Transaction rejected by wallet: {0}")]
    UserRejected(String),

    #[error("Ledger network error: {0}")]
    NetworkError(String),

    #[error("Transaction expired: block height exceeded")]
    Expired,

    #[error("{0}")]
    Payment(String),

    #[error("No wallet connected")]
    WalletNotConnected,
}

impl PaymentError {
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::UserRejected(_) => "USER_REJECTED",
            PaymentError::NetworkError(_) => "NETWORK_ERROR",
            PaymentError::Expired => "TRANSACTION_EXPIRED",
            PaymentError::Payment(_) => "PAYMENT_ERROR",
            PaymentError::WalletNotConnected => "WALLET_NOT_CONNECTED",
        }
    }
}

/// Errors raised by the ledger RPC layer
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Signature {signature} has expired: block height exceeded")]
    BlockHeightExceeded { signature: String },

    #[error("Ledger service unavailable: {0}")]
    Unavailable(String),

    #[error("Ledger RPC error: {0}")]
    Rpc(String),
}

impl From<LedgerError> for PaymentError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::BlockHeightExceeded { .. } => PaymentError::Expired,
            LedgerError::Unavailable(message) => PaymentError::NetworkError(message),
            LedgerError::Rpc(message) => PaymentError::Payment(message),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(error: LedgerError) -> Self {
        AppError::Payment(error.into())
    }
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
            AppError::Payment(error) => (
                StatusCode::PAYMENT_REQUIRED,
                error.code(),
                error.to_string(),
                None,
            ),
            AppError::PaymentInProgress => (
                StatusCode::CONFLICT,
                "PAYMENT_IN_PROGRESS",
                "A payment for this action is already being processed".to_string(),
                None,
            ),
            AppError::PaymentAlreadyRedeemed(signature) => (
                StatusCode::CONFLICT,
                "PAYMENT_ALREADY_REDEEMED",
                "This payment has already been used".to_string(),
                Some(serde_json::json!({ "signature": signature })),
            ),
            AppError::ContinuationRequired(room_id) => (
                StatusCode::PAYMENT_REQUIRED,
                "CONTINUATION_PAYMENT_REQUIRED",
                "A continuation payment is required to keep the conversation going".to_string(),
                Some(serde_json::json!({ "room_id": room_id })),
            ),
            AppError::ContinuationNotRequired(room_id) => (
                StatusCode::BAD_REQUEST,
                "CONTINUATION_NOT_REQUIRED",
                "No continuation payment is due for this room".to_string(),
                Some(serde_json::json!({ "room_id": room_id })),
            ),
            AppError::TurnInProgress(room_id) => (
                StatusCode::CONFLICT,
                "TURN_IN_PROGRESS",
                "A response is already being generated".to_string(),
                Some(serde_json::json!({ "room_id": room_id })),
            ),
            AppError::ContinuationInProgress(room_id) => (
                StatusCode::CONFLICT,
                "CONTINUATION_IN_PROGRESS",
                "A continuation payment for this room is already being processed".to_string(),
                Some(serde_json::json!({ "room_id": room_id })),
            ),
            AppError::Completion(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMPLETION_FAILED",
                "An error occurred while generating the response".to_string(),
                None,
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Rate limit exceeded. Please try again later.".to_string(),
                None,
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Not found: {}", what),
                None,
            ),
            AppError::InvalidInput(message) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                message,
                None,
            ),
            AppError::InvalidAddress(message) => (
                StatusCode::BAD_REQUEST,
                "INVALID_ADDRESS",
                message,
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

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_errors_are_classified() {
        let expired: PaymentError = LedgerError::BlockHeightExceeded {
            signature: "abc".to_string(),
        }
        .into();
        assert_eq!(expired, PaymentError::Expired);

        let network: PaymentError = LedgerError::Unavailable("403 Forbidden".to_string()).into();
        assert_eq!(network.code(), "NETWORK_ERROR");

        let generic: PaymentError = LedgerError::Rpc("504 timeout".to_string()).into();
        assert_eq!(generic, PaymentError::Payment("504 timeout".to_string()));
    }

    #[test]
    fn test_payment_error_response_status() {
        let response = AppError::Payment(PaymentError::Expired).into_response();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

        let response = AppError::PaymentInProgress.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::Completion("upstream 500".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
