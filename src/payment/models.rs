use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature};

use crate::error::PaymentError;

/// A single token transfer, amounts already scaled to base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub token_mint: Pubkey,
    pub sender: Pubkey,
    pub recipient: Pubkey,
    pub amount_base_units: u64,
}

impl TransferRequest {
    /// Build a request from a UI amount (`amount` whole tokens with `decimals`
    /// places). Rejects negative amounts, fractional base units and overflow.
    pub fn new(
        token_mint: Pubkey,
        sender: Pubkey,
        recipient: Pubkey,
        amount: Decimal,
        decimals: u8,
    ) -> Result<Self, PaymentError> {
        let amount_base_units = to_base_units(amount, decimals)?;

        Ok(Self {
            token_mint,
            sender,
            recipient,
            amount_base_units,
        })
    }
}

pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<u64, PaymentError> {
    if amount.is_sign_negative() {
        return Err(PaymentError::Payment(format!(
            "Transfer amount cannot be negative: {}",
            amount
        )));
    }

    let scale = 10u64
        .checked_pow(u32::from(decimals))
        .ok_or_else(|| PaymentError::Payment(format!("Unsupported token decimals: {}", decimals)))?;

    let scaled = amount
        .checked_mul(Decimal::from(scale))
        .ok_or_else(|| PaymentError::Payment(format!("Transfer amount too large: {}", amount)))?;

    if !scaled.fract().is_zero() {
        return Err(PaymentError::Payment(format!(
            "Transfer amount {} has more than {} decimal places",
            amount, decimals
        )));
    }

    scaled
        .to_u64()
        .ok_or_else(|| PaymentError::Payment(format!("Transfer amount too large: {}", amount)))
}

/// Recent blockhash plus the last block height at which a transaction
/// referencing it can still land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessCheckpoint {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmittedTransaction {
    pub signature: Signature,
    pub checkpoint: FreshnessCheckpoint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed,
    Failed(PaymentError),
    Indeterminate,
}

impl ConfirmationOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ConfirmationOutcome::Confirmed)
    }

    /// Indeterminate never reaches a caller: once every check has run, a
    /// transaction nobody can find is a failed payment.
    pub fn escalate(self) -> Self {
        match self {
            ConfirmationOutcome::Indeterminate => ConfirmationOutcome::Failed(
                PaymentError::Payment("Transaction not confirmed properly".to_string()),
            ),
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationOutcome::Confirmed => "confirmed",
            ConfirmationOutcome::Failed(_) => "failed",
            ConfirmationOutcome::Indeterminate => "indeterminate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationLevel {
    Processed,
    Confirmed,
    Finalized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureStatus {
    pub confirmation: ConfirmationLevel,
    pub err: Option<String>,
}

impl SignatureStatus {
    /// Confirmed or finalized without an execution error.
    pub fn is_confirmed(&self) -> bool {
        self.err.is_none() && self.confirmation >= ConfirmationLevel::Confirmed
    }
}

/// Net change of one token account's balance across a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBalanceDelta {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: i128,
}

/// A transaction found in ledger history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRecord {
    pub slot: u64,
    /// Unix seconds, when the node knows it
    pub block_time: Option<i64>,
    pub err: Option<String>,
    pub token_deltas: Vec<TokenBalanceDelta>,
}

impl TransactionRecord {
    pub fn outcome(&self) -> ConfirmationOutcome {
        match &self.err {
            Some(err) => ConfirmationOutcome::Failed(PaymentError::Payment(err.clone())),
            None => ConfirmationOutcome::Confirmed,
        }
    }

    /// Base units of `mint` credited to accounts owned by `owner`.
    pub fn received(&self, mint: &Pubkey, owner: &Pubkey) -> i128 {
        self.token_deltas
            .iter()
            .filter(|delta| delta.mint == *mint && delta.owner == *owner)
            .map(|delta| delta.amount)
            .sum()
    }
}

/// Structured result of a confirmation wait.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationReport {
    pub err: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transfer_amount_scaled_by_decimals() {
        let request = TransferRequest::new(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            dec!(1000000),
            6,
        )
        .unwrap();

        assert_eq!(request.amount_base_units, 1_000_000_000_000);
        assert_eq!(to_base_units(dec!(0.5), 6).unwrap(), 500_000);
    }

    #[test]
    fn test_transfer_amount_rejects_invalid_values() {
        assert!(to_base_units(dec!(-1), 6).is_err());
        assert!(to_base_units(dec!(0.0000001), 6).is_err());
        assert!(to_base_units(dec!(100000000000000), 9).is_err());
        assert_eq!(to_base_units(dec!(0), 6).unwrap(), 0);
    }

    #[test]
    fn test_signature_status_confirmation() {
        let pending = SignatureStatus {
            confirmation: ConfirmationLevel::Processed,
            err: None,
        };
        assert!(!pending.is_confirmed());

        let finalized = SignatureStatus {
            confirmation: ConfirmationLevel::Finalized,
            err: None,
        };
        assert!(finalized.is_confirmed());

        let failed = SignatureStatus {
            confirmation: ConfirmationLevel::Confirmed,
            err: Some("InsufficientFunds".to_string()),
        };
        assert!(!failed.is_confirmed());
    }

    #[test]
    fn test_received_sums_matching_deltas() {
        let mint = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();
        let sender = Pubkey::new_unique();
        let record = TransactionRecord {
            slot: 1,
            token_deltas: vec![
                TokenBalanceDelta { mint, owner: sender, amount: -700 },
                TokenBalanceDelta { mint, owner: recipient, amount: 500 },
                TokenBalanceDelta { mint, owner: recipient, amount: 200 },
                TokenBalanceDelta { mint: Pubkey::new_unique(), owner: recipient, amount: 9_000 },
            ],
            ..TransactionRecord::default()
        };

        assert_eq!(record.received(&mint, &recipient), 700);
        assert_eq!(record.received(&mint, &sender), -700);
        assert_eq!(record.received(&Pubkey::new_unique(), &recipient), 0);
    }

    #[test]
    fn test_indeterminate_escalates_to_failure() {
        let outcome = ConfirmationOutcome::Indeterminate.escalate();
        assert!(matches!(outcome, ConfirmationOutcome::Failed(PaymentError::Payment(_))));
        assert!(ConfirmationOutcome::Confirmed.escalate().is_confirmed());
    }
}
