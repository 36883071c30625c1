use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::{str::FromStr, time::Duration};

use super::models::{to_base_units, TransferRequest};
use crate::error::{AppError, AppResult, PaymentError};

pub const DEFAULT_TOKEN_MINT: &str = "J3D728v2apramx6UydCVHfKtBC7wfKmc1YUHJJ6Ppump";
pub const DEFAULT_RECIPIENT: &str = "86kXaTTKGg9GmfH2Gr1syACs2SXEoyostL2bL7E19oV8";

/// Which gated action a payment unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    RoomCreation,
    Continuation,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::RoomCreation => "room_creation",
            PaymentKind::Continuation => "continuation",
        }
    }
}

impl FromStr for PaymentKind {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "room" | "room_creation" => Ok(PaymentKind::RoomCreation),
            "continue" | "continuation" => Ok(PaymentKind::Continuation),
            other => Err(AppError::InvalidInput(format!("Unknown payment kind: {}", other))),
        }
    }
}

/// Fees and cadence for the gated actions. Product values, kept as
/// configuration.
#[derive(Debug, Clone)]
pub struct PaymentPolicy {
    pub token_mint: Pubkey,
    pub recipient: Pubkey,
    pub token_decimals: u8,
    pub room_fee: Decimal,
    pub continuation_fee: Decimal,
    /// Exchanged turns between continuation payments
    pub continuation_cadence: usize,
    /// How old a transfer may be when redeemed. Redeemed signatures are
    /// remembered for the same span.
    pub redeem_window: Duration,
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        Self {
            token_mint: Pubkey::from_str_const(DEFAULT_TOKEN_MINT),
            recipient: Pubkey::from_str_const(DEFAULT_RECIPIENT),
            token_decimals: 6,
            room_fee: Decimal::from(1_000_000),
            continuation_fee: Decimal::from(500_000),
            continuation_cadence: 3,
            redeem_window: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl PaymentPolicy {
    pub fn fee(&self, kind: PaymentKind) -> Decimal {
        match kind {
            PaymentKind::RoomCreation => self.room_fee,
            PaymentKind::Continuation => self.continuation_fee,
        }
    }

    pub fn fee_base_units(&self, kind: PaymentKind) -> Result<u64, PaymentError> {
        to_base_units(self.fee(kind), self.token_decimals)
    }

    pub fn transfer_request(
        &self,
        sender: Pubkey,
        kind: PaymentKind,
    ) -> Result<TransferRequest, PaymentError> {
        TransferRequest::new(
            self.token_mint,
            sender,
            self.recipient,
            self.fee(kind),
            self.token_decimals,
        )
    }
}
