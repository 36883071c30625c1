use solana_sdk::signature::Signature;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    ledger::LedgerClient,
    models::{ConfirmationLevel, ConfirmationOutcome, FreshnessCheckpoint},
};
use crate::error::{LedgerError, PaymentError};

/// Turns a submitted signature into one terminal [`ConfirmationOutcome`].
///
/// The ledger is eventually consistent: a landed transaction can show up
/// in status queries, in history, or in the confirmation wait at different
/// times, and any of those calls may error without the transaction having
/// failed. Checks therefore run in sequence, and a transaction found in
/// history settles the outcome no matter which check found it.
pub struct Reconciler {
    ledger: Arc<dyn LedgerClient>,
}

impl Reconciler {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }

    #[instrument(skip(self, checkpoint), fields(signature = %signature))]
    pub async fn reconcile(
        &self,
        signature: &Signature,
        checkpoint: &FreshnessCheckpoint,
    ) -> ConfirmationOutcome {
        let outcome = match self.run_checks(signature, checkpoint).await {
            Ok(outcome) => outcome,
            Err(error) => self.recover(signature, error).await,
        };

        match &outcome {
            ConfirmationOutcome::Confirmed => info!("✅ Payment confirmed"),
            ConfirmationOutcome::Failed(reason) => warn!("Payment failed: {}", reason),
            ConfirmationOutcome::Indeterminate => warn!("Payment still indeterminate"),
        }

        outcome
    }

    async fn run_checks(
        &self,
        signature: &Signature,
        checkpoint: &FreshnessCheckpoint,
    ) -> Result<ConfirmationOutcome, LedgerError> {
        // 1. Cheap status query
        if let Some(status) = self.ledger.signature_status(signature, false).await? {
            if status.is_confirmed() {
                info!("Signature already {:?}", status.confirmation);
                return Ok(ConfirmationOutcome::Confirmed);
            }
        }

        // 2. Already recorded? Skip the wait entirely
        let early = self.check_history(signature).await?;
        if early != ConfirmationOutcome::Indeterminate {
            info!("Transaction already present in history");
            return Ok(early);
        }

        // 3. Block until finalized or the checkpoint expires
        let report = self
            .ledger
            .wait_for_confirmation(signature, checkpoint, ConfirmationLevel::Finalized)
            .await?;

        if let Some(err) = report.err {
            return Ok(ConfirmationOutcome::Failed(PaymentError::Payment(err)));
        }

        // 4. The wait returned cleanly, make sure the status agrees
        if let Some(status) = self.ledger.signature_status(signature, true).await? {
            if status.is_confirmed() {
                return Ok(ConfirmationOutcome::Confirmed);
            }
        }

        // 5. Last word goes to history
        Ok(self.check_history(signature).await?.escalate())
    }

    /// Found without error is Confirmed, found with error is Failed,
    /// missing is Indeterminate.
    pub async fn check_history(
        &self,
        signature: &Signature,
    ) -> Result<ConfirmationOutcome, LedgerError> {
        Ok(match self.ledger.transaction_record(signature).await? {
            Some(record) => record.outcome(),
            None => ConfirmationOutcome::Indeterminate,
        })
    }

    async fn recover(&self, signature: &Signature, error: LedgerError) -> ConfirmationOutcome {
        warn!("Confirmation check failed, consulting history: {}", error);

        match self.check_history(signature).await {
            Ok(ConfirmationOutcome::Indeterminate) => ConfirmationOutcome::Failed(error.into()),
            Ok(outcome) => {
                info!("Transaction found in history despite error");
                outcome
            }
            Err(lookup_error) => {
                warn!("History lookup failed as well: {}", lookup_error);
                ConfirmationOutcome::Failed(error.into())
            }
        }
    }
}
