use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::{hash::Hash, signature::Signature};
use std::str::FromStr;
use validator::Validate;

use crate::{
    conversation::{Language, Message, Room},
    error::{AppError, AppResult},
    payment::{ConfirmationOutcome, FreshnessCheckpoint, SubmittedTransaction},
};

// ========== REQUEST MODELS ==========

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 8000, message = "prompt must be 1-8000 characters"))]
    pub prompt: String,
    /// Language key, unknown keys fall back to English
    pub language: Option<String>,
}

/// What a browser wallet hands back after broadcasting a payment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentProof {
    #[validate(length(min = 32, max = 128, message = "signature has an invalid length"))]
    pub signature: String,
    #[validate(length(min = 32, max = 64, message = "blockhash has an invalid length"))]
    pub blockhash: String,
    pub last_valid_block_height: u64,
}

impl PaymentProof {
    pub fn to_submitted(&self) -> AppResult<SubmittedTransaction> {
        let signature = Signature::from_str(&self.signature)
            .map_err(|e| AppError::InvalidInput(format!("Invalid signature: {}", e)))?;
        let blockhash = Hash::from_str(&self.blockhash)
            .map_err(|e| AppError::InvalidInput(format!("Invalid blockhash: {}", e)))?;

        Ok(SubmittedTransaction {
            signature,
            checkpoint: FreshnessCheckpoint {
                blockhash,
                last_valid_block_height: self.last_valid_block_height,
            },
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 200, message = "ai1_role must be 1-200 characters"))]
    pub ai1_role: String,
    #[validate(length(min = 1, max = 200, message = "ai2_role must be 1-200 characters"))]
    pub ai2_role: String,
    #[validate(length(min = 1, max = 500, message = "topic must be 1-500 characters"))]
    pub topic: String,
    pub language: Option<String>,
    #[validate]
    pub payment: PaymentProof,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContinueRequest {
    #[validate]
    pub payment: PaymentProof,
}

// ========== RESPONSE MODELS ==========

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub token_mint: String,
    pub recipient: String,
    pub token_decimals: u8,
    pub room_fee: String,
    pub room_fee_base_units: u64,
    pub continuation_fee: String,
    pub continuation_fee_base_units: u64,
    pub continuation_cadence: usize,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub signature: String,
    pub outcome: String,
    pub confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReconcileResponse {
    pub fn new(signature: String, outcome: &ConfirmationOutcome) -> Self {
        let (error_code, error) = match outcome {
            ConfirmationOutcome::Failed(e) => (Some(e.code().to_string()), Some(e.to_string())),
            _ => (None, None),
        };

        Self {
            signature,
            outcome: outcome.as_str().to_string(),
            confirmed: outcome.is_confirmed(),
            error_code,
            error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub id: String,
    pub ai1_role: String,
    pub ai2_role: String,
    pub topic: String,
    pub language: Language,
    pub messages: Vec<Message>,
    pub continuation_required: bool,
    pub created_at: DateTime<Utc>,
}

impl RoomResponse {
    pub fn from_room(room: Room, cadence: usize) -> Self {
        let continuation_required = room.requires_payment(cadence);

        Self {
            id: room.id,
            ai1_role: room.ai1_role,
            ai2_role: room.ai2_role,
            topic: room.topic,
            language: room.language,
            messages: room.messages,
            continuation_required,
            created_at: room.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub room_id: String,
    pub added: Vec<Message>,
    pub message_count: usize,
    pub continuation_required: bool,
}

/// Runs `validator` rules and folds field errors into one message
pub fn validate_request<T: Validate>(request: &T) -> AppResult<()> {
    request.validate().map_err(|e| {
        let errors = e
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let messages: Vec<String> = errors
                    .iter()
                    .map(|e| e.message.as_ref().map(|s| s.to_string()).unwrap_or_default())
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect::<Vec<String>>()
            .join("; ");

        AppError::InvalidInput(format!("Validation failed: {}", errors))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaymentError;

    fn proof(signature: String) -> PaymentProof {
        PaymentProof {
            signature,
            blockhash: Hash::new_from_array([3; 32]).to_string(),
            last_valid_block_height: 99,
        }
    }

    #[test]
    fn test_proof_parses() {
        let signature = Signature::new_unique();
        let submitted = proof(signature.to_string()).to_submitted().unwrap();

        assert_eq!(submitted.signature, signature);
        assert_eq!(submitted.checkpoint.last_valid_block_height, 99);
    }

    #[test]
    fn test_proof_rejects_garbage() {
        let result = proof("0OIl".repeat(20)).to_submitted();
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let request = ChatRequest {
            prompt: String::new(),
            language: None,
        };

        let err = validate_request(&request).unwrap_err();
        assert!(err.to_string().contains("prompt"));
    }

    #[test]
    fn test_reconcile_response_carries_code() {
        let response = ReconcileResponse::new(
            "sig".to_string(),
            &ConfirmationOutcome::Failed(PaymentError::Expired),
        );

        assert!(!response.confirmed);
        assert_eq!(response.error_code.as_deref(), Some("TRANSACTION_EXPIRED"));
    }
}
