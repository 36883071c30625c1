use async_trait::async_trait;
use solana_sdk::{signature::Signature, transaction::Transaction};

use super::models::{
    ConfirmationLevel, ConfirmationReport, FreshnessCheckpoint, SignatureStatus, TransactionRecord,
};
use crate::error::LedgerError;

/// Ledger RPC operations the payment flow consumes.
///
/// Every call may fail transiently without saying anything about the
/// transaction itself; callers must not treat a single error as proof of
/// failure.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Recent blockhash at finalized commitment plus its expiry height
    async fn latest_checkpoint(&self) -> Result<FreshnessCheckpoint, LedgerError>;

    /// Current status of a signature, `None` if the ledger has not seen it
    async fn signature_status(
        &self,
        signature: &Signature,
        search_history: bool,
    ) -> Result<Option<SignatureStatus>, LedgerError>;

    /// Look a transaction up in ledger history, `None` if it is not recorded
    async fn transaction_record(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionRecord>, LedgerError>;

    /// Block until the signature reaches `level`, reports an execution
    /// error, or the checkpoint's last valid block height passes
    async fn wait_for_confirmation(
        &self,
        signature: &Signature,
        checkpoint: &FreshnessCheckpoint,
        level: ConfirmationLevel,
    ) -> Result<ConfirmationReport, LedgerError>;

    /// Broadcast a signed transaction
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError>;
}
