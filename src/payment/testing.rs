//! Scripted ledger used by the payment tests.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::collections::VecDeque;

use super::{
    ledger::LedgerClient,
    models::{
        ConfirmationLevel, ConfirmationReport, FreshnessCheckpoint, SignatureStatus,
        TokenBalanceDelta, TransactionRecord,
    },
    policy::{PaymentKind, PaymentPolicy},
};
use crate::error::LedgerError;

/// Answers each call from a queue of scripted responses. Empty queues
/// answer "not seen" for lookups and fail waits.
#[derive(Default)]
pub struct StubLedger {
    statuses: Mutex<VecDeque<Result<Option<SignatureStatus>, LedgerError>>>,
    records: Mutex<VecDeque<Result<Option<TransactionRecord>, LedgerError>>>,
    waits: Mutex<VecDeque<Result<ConfirmationReport, LedgerError>>>,
    checkpoint_error: Mutex<Option<LedgerError>>,
    send_error: Mutex<Option<LedgerError>>,
    sent: Mutex<Vec<Transaction>>,
    calls: Mutex<Vec<&'static str>>,
    stalled_statuses: Mutex<usize>,
    yielding: bool,
}

impl StubLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(self, response: Result<Option<SignatureStatus>, LedgerError>) -> Self {
        self.statuses.lock().push_back(response);
        self
    }

    pub fn record(self, response: Result<Option<TransactionRecord>, LedgerError>) -> Self {
        self.records.lock().push_back(response);
        self
    }

    pub fn wait(self, response: Result<ConfirmationReport, LedgerError>) -> Self {
        self.waits.lock().push_back(response);
        self
    }

    pub fn checkpoint_fails(self, error: LedgerError) -> Self {
        *self.checkpoint_error.lock() = Some(error);
        self
    }

    pub fn send_fails(self, error: LedgerError) -> Self {
        *self.send_error.lock() = Some(error);
        self
    }

    /// The next status query never answers.
    pub fn stall_status(self) -> Self {
        *self.stalled_statuses.lock() += 1;
        self
    }

    /// Status queries yield to the scheduler before answering.
    pub fn yielding(mut self) -> Self {
        self.yielding = true;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().clone()
    }

    fn called(&self, name: &'static str) {
        self.calls.lock().push(name);
    }
}

pub fn checkpoint() -> FreshnessCheckpoint {
    FreshnessCheckpoint {
        blockhash: Hash::new_from_array([7; 32]),
        last_valid_block_height: 1_000,
    }
}

pub fn pending() -> Option<SignatureStatus> {
    Some(SignatureStatus {
        confirmation: ConfirmationLevel::Processed,
        err: None,
    })
}

pub fn confirmed() -> Option<SignatureStatus> {
    Some(SignatureStatus {
        confirmation: ConfirmationLevel::Confirmed,
        err: None,
    })
}

pub fn landed() -> Option<TransactionRecord> {
    Some(TransactionRecord {
        slot: 42,
        block_time: Some(Utc::now().timestamp()),
        ..TransactionRecord::default()
    })
}

pub fn reverted(err: &str) -> Option<TransactionRecord> {
    Some(TransactionRecord {
        slot: 42,
        block_time: Some(Utc::now().timestamp()),
        err: Some(err.to_string()),
        ..TransactionRecord::default()
    })
}

/// A landed transfer crediting `amount` of `mint` to `owner`.
pub fn paid(mint: &Pubkey, owner: &Pubkey, amount: u64) -> Option<TransactionRecord> {
    landed().map(|record| TransactionRecord {
        token_deltas: vec![TokenBalanceDelta {
            mint: *mint,
            owner: *owner,
            amount: i128::from(amount),
        }],
        ..record
    })
}

/// A landed transfer of exactly the default fee for `kind`.
pub fn paid_fee(kind: PaymentKind) -> Option<TransactionRecord> {
    let policy = PaymentPolicy::default();
    let amount = policy.fee_base_units(kind).unwrap();
    paid(&policy.token_mint, &policy.recipient, amount)
}

#[async_trait]
impl LedgerClient for StubLedger {
    async fn latest_checkpoint(&self) -> Result<FreshnessCheckpoint, LedgerError> {
        self.called("latest_checkpoint");
        match self.checkpoint_error.lock().take() {
            Some(error) => Err(error),
            None => Ok(checkpoint()),
        }
    }

    async fn signature_status(
        &self,
        _signature: &Signature,
        search_history: bool,
    ) -> Result<Option<SignatureStatus>, LedgerError> {
        self.called(if search_history {
            "signature_status_with_history"
        } else {
            "signature_status"
        });

        let stall = {
            let mut stalled = self.stalled_statuses.lock();
            let stall = *stalled > 0;
            *stalled = stalled.saturating_sub(1);
            stall
        };
        if stall {
            std::future::pending::<()>().await;
        }
        if self.yielding {
            tokio::task::yield_now().await;
        }

        self.statuses.lock().pop_front().unwrap_or(Ok(None))
    }

    async fn transaction_record(
        &self,
        _signature: &Signature,
    ) -> Result<Option<TransactionRecord>, LedgerError> {
        self.called("transaction_record");
        self.records.lock().pop_front().unwrap_or(Ok(None))
    }

    async fn wait_for_confirmation(
        &self,
        _signature: &Signature,
        _checkpoint: &FreshnessCheckpoint,
        _level: ConfirmationLevel,
    ) -> Result<ConfirmationReport, LedgerError> {
        self.called("wait_for_confirmation");
        self.waits
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(LedgerError::Rpc("unscripted wait".to_string())))
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        self.called("send_transaction");
        if let Some(error) = self.send_error.lock().take() {
            return Err(error);
        }
        self.sent.lock().push(transaction.clone());
        Ok(transaction.signatures[0])
    }
}
