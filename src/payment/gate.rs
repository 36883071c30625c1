use chrono::Utc;
use parking_lot::Mutex;
use solana_sdk::signature::Signature;
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument, warn};

use super::{
    ledger::LedgerClient,
    models::{ConfirmationOutcome, FreshnessCheckpoint, SubmittedTransaction},
    policy::{PaymentKind, PaymentPolicy},
    reconciler::Reconciler,
    state::PaymentState,
};
use crate::error::{AppError, AppResult, PaymentError};

#[derive(Debug, Clone, Default)]
struct Attempt {
    state: PaymentState,
    /// Unix seconds after which a redeemed entry is forgotten
    expires_at: Option<i64>,
}

/// Server-side guard in front of the gated actions.
///
/// Each signature unlocks at most one action. Attempts are keyed by
/// signature so two requests carrying the same one cannot both pass.
/// Only in-flight and redeemed signatures are kept; a redeemed one is
/// forgotten once its transfer is too old to be redeemed again.
pub struct PaymentGate {
    ledger: Arc<dyn LedgerClient>,
    reconciler: Reconciler,
    policy: Arc<PaymentPolicy>,
    attempts: Mutex<HashMap<Signature, Attempt>>,
}

/// Holds a signature in `AwaitingConfirmation`. Dropping it without
/// [`AttemptClaim::redeemed`] forgets the attempt, so an abandoned or failed
/// redeem never blocks a retry.
struct AttemptClaim<'a> {
    attempts: &'a Mutex<HashMap<Signature, Attempt>>,
    signature: Signature,
    armed: bool,
}

impl AttemptClaim<'_> {
    fn redeemed(mut self, expires_at: i64) {
        self.armed = false;
        self.attempts.lock().insert(
            self.signature,
            Attempt {
                state: PaymentState::Done(ConfirmationOutcome::Confirmed),
                expires_at: Some(expires_at),
            },
        );
    }
}

impl Drop for AttemptClaim<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.attempts.lock().remove(&self.signature);
        }
    }
}

impl PaymentGate {
    pub fn new(ledger: Arc<dyn LedgerClient>, policy: Arc<PaymentPolicy>) -> Self {
        Self {
            reconciler: Reconciler::new(ledger.clone()),
            ledger,
            policy,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    #[instrument(skip(self, submitted), fields(kind = kind.as_str(), signature = %submitted.signature))]
    pub async fn redeem(&self, kind: PaymentKind, submitted: &SubmittedTransaction) -> AppResult<()> {
        let signature = submitted.signature;
        let claim = self.claim(signature)?;

        let outcome = self
            .reconciler
            .reconcile(&signature, &submitted.checkpoint)
            .await
            .escalate();

        if let ConfirmationOutcome::Failed(e) = outcome {
            return Err(e.into());
        }

        self.verify_transfer(kind, &signature)
            .await
            .inspect_err(|e| warn!("Confirmed transfer rejected: {}", e))?;

        claim.redeemed(Utc::now().timestamp().saturating_add(self.window_secs()));
        info!("Payment redeemed");
        Ok(())
    }

    /// Reconciles without redeeming. Diagnostic only.
    pub async fn reconcile(
        &self,
        signature: &Signature,
        checkpoint: &FreshnessCheckpoint,
    ) -> ConfirmationOutcome {
        self.reconciler.reconcile(signature, checkpoint).await
    }

    pub fn state_of(&self, signature: &Signature) -> PaymentState {
        self.attempts
            .lock()
            .get(signature)
            .map(|attempt| attempt.state.clone())
            .unwrap_or_default()
    }

    fn claim(&self, signature: Signature) -> AppResult<AttemptClaim<'_>> {
        let now = Utc::now().timestamp();
        let mut attempts = self.attempts.lock();
        attempts.retain(|_, attempt| attempt.expires_at.map_or(true, |at| at > now));

        let attempt = attempts.entry(signature).or_default();
        if matches!(attempt.state, PaymentState::Done(ConfirmationOutcome::Confirmed)) {
            warn!("Signature already redeemed");
            return Err(AppError::PaymentAlreadyRedeemed(signature.to_string()));
        }
        attempt.state.await_confirmation(signature)?;

        Ok(AttemptClaim {
            attempts: &self.attempts,
            signature,
            armed: true,
        })
    }

    /// The recorded transfer must credit at least the fee for `kind` in the
    /// configured mint to the configured recipient, inside the redeem window.
    async fn verify_transfer(&self, kind: PaymentKind, signature: &Signature) -> Result<(), PaymentError> {
        let required = self.policy.fee_base_units(kind)?;
        let record = self
            .ledger
            .transaction_record(signature)
            .await?
            .ok_or_else(|| PaymentError::Payment("Transfer details not available yet".to_string()))?;

        if let ConfirmationOutcome::Failed(e) = record.outcome() {
            return Err(e);
        }

        let oldest = Utc::now().timestamp().saturating_sub(self.window_secs());
        match record.block_time {
            Some(block_time) if block_time >= oldest => {}
            Some(_) => {
                return Err(PaymentError::Payment(
                    "Transfer is too old to be redeemed".to_string(),
                ))
            }
            None => {
                return Err(PaymentError::Payment(
                    "Transfer time not available yet".to_string(),
                ))
            }
        }

        let received = record.received(&self.policy.token_mint, &self.policy.recipient);
        if received < i128::from(required) {
            return Err(PaymentError::Payment(format!(
                "Transfer credited {} base units to {}, {} requires {}",
                received,
                self.policy.recipient,
                kind.as_str(),
                required
            )));
        }

        Ok(())
    }

    fn window_secs(&self) -> i64 {
        i64::try_from(self.policy.redeem_window.as_secs()).unwrap_or(i64::MAX)
    }
}
