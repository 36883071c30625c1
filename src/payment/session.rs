use parking_lot::Mutex;
use serde::Serialize;
use solana_sdk::signature::Signature;
use std::sync::Arc;
use tracing::{error, info};

use super::{
    ledger::LedgerClient,
    models::ConfirmationOutcome,
    policy::{PaymentKind, PaymentPolicy},
    reconciler::Reconciler,
    state::PaymentState,
    submitter::TransactionSubmitter,
};
use crate::{
    error::{AppResult, PaymentError},
    wallet::Wallet,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub kind: PaymentKind,
    pub signature: String,
    pub amount_base_units: u64,
}

/// Payer-side flow: submit through the wallet, then reconcile.
///
/// One attempt at a time; a second `pay` while the first is in flight
/// fails with `PaymentInProgress`.
pub struct PaymentSession {
    submitter: TransactionSubmitter,
    reconciler: Reconciler,
    policy: Arc<PaymentPolicy>,
    state: Mutex<PaymentState>,
}

impl PaymentSession {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        wallet: Arc<dyn Wallet>,
        policy: Arc<PaymentPolicy>,
    ) -> Self {
        Self {
            submitter: TransactionSubmitter::new(ledger.clone(), wallet),
            reconciler: Reconciler::new(ledger),
            policy,
            state: Mutex::new(PaymentState::Idle),
        }
    }

    pub fn state(&self) -> PaymentState {
        self.state.lock().clone()
    }

    pub async fn pay(&self, kind: PaymentKind) -> AppResult<PaymentReceipt> {
        self.state.lock().begin_submission()?;

        let request = match self.submitter.owner() {
            Some(owner) => self.policy.transfer_request(owner, kind),
            None => Err(PaymentError::WalletNotConnected),
        };

        let submitted = match request {
            Ok(request) => self
                .submitter
                .submit(&request)
                .await
                .map(|submitted| (submitted, request.amount_base_units)),
            Err(e) => Err(e),
        };

        let (submitted, amount_base_units) = match submitted {
            Ok(submitted) => submitted,
            Err(e) => {
                error!("Payment submission failed: {}", e);
                self.state
                    .lock()
                    .finish(ConfirmationOutcome::Failed(e.clone()));
                return Err(e.into());
            }
        };

        self.state.lock().await_confirmation(submitted.signature)?;

        info!("Waiting for confirmation of {}", submitted.signature);
        let outcome = self
            .reconciler
            .reconcile(&submitted.signature, &submitted.checkpoint)
            .await
            .escalate();

        self.state.lock().finish(outcome.clone());

        match outcome {
            ConfirmationOutcome::Failed(e) => Err(e.into()),
            _ => Ok(receipt(kind, &submitted.signature, amount_base_units)),
        }
    }
}

fn receipt(kind: PaymentKind, signature: &Signature, amount_base_units: u64) -> PaymentReceipt {
    PaymentReceipt {
        kind,
        signature: signature.to_string(),
        amount_base_units,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{AppError, LedgerError},
        payment::{
            models::ConfirmationReport,
            testing::{confirmed, landed, pending, StubLedger},
        },
        wallet::KeypairWallet,
    };
    use solana_sdk::signature::Keypair;

    async fn session_with(ledger: StubLedger, connect: bool) -> PaymentSession {
        let wallet = Arc::new(KeypairWallet::new(Keypair::new()));
        if connect {
            wallet.connect().await.unwrap();
        }
        PaymentSession::new(Arc::new(ledger), wallet, Arc::new(PaymentPolicy::default()))
    }

    #[tokio::test]
    async fn test_pay_confirms_continuation() {
        let ledger = StubLedger::new()
            .status(Ok(pending()))
            .record(Ok(landed()));
        let session = session_with(ledger, true).await;

        let receipt = session.pay(PaymentKind::Continuation).await.unwrap();

        assert_eq!(receipt.amount_base_units, 500_000_000_000);
        assert_eq!(session.state(), PaymentState::Done(ConfirmationOutcome::Confirmed));
    }

    #[tokio::test]
    async fn test_pay_without_wallet_finishes_failed() {
        let session = session_with(StubLedger::new(), false).await;

        let result = session.pay(PaymentKind::RoomCreation).await;

        assert!(matches!(
            result,
            Err(AppError::Payment(PaymentError::WalletNotConnected))
        ));
        assert_eq!(
            session.state(),
            PaymentState::Done(ConfirmationOutcome::Failed(PaymentError::WalletNotConnected))
        );
    }

    #[tokio::test]
    async fn test_pay_reports_expiry() {
        let ledger = StubLedger::new()
            .status(Ok(pending()))
            .record(Ok(None))
            .wait(Err(LedgerError::BlockHeightExceeded {
                signature: "sig".to_string(),
            }))
            .record(Ok(None));
        let session = session_with(ledger, true).await;

        let result = session.pay(PaymentKind::RoomCreation).await;

        assert!(matches!(result, Err(AppError::Payment(PaymentError::Expired))));
        assert!(!session.state().is_busy());
    }

    #[tokio::test]
    async fn test_failed_payment_can_be_retried() {
        let ledger = StubLedger::new()
            .status(Ok(pending()))
            .record(Ok(None))
            .wait(Ok(ConfirmationReport {
                err: Some("InsufficientFunds".to_string()),
            }))
            .status(Ok(confirmed()));
        let session = session_with(ledger, true).await;

        assert!(session.pay(PaymentKind::RoomCreation).await.is_err());
        assert!(session.pay(PaymentKind::RoomCreation).await.is_ok());
    }
}
