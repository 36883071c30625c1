use solana_sdk::signature::Signature;

use super::models::ConfirmationOutcome;
use crate::error::{AppError, AppResult};

/// Progress of one payment attempt.
///
/// `Done` is not sticky: a new attempt may start from it, which is how a
/// caller re-initiates after a failure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PaymentState {
    #[default]
    Idle,
    Submitting,
    AwaitingConfirmation {
        signature: Signature,
    },
    Done(ConfirmationOutcome),
}

impl PaymentState {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PaymentState::Submitting | PaymentState::AwaitingConfirmation { .. }
        )
    }

    pub fn begin_submission(&mut self) -> AppResult<()> {
        if self.is_busy() {
            return Err(AppError::PaymentInProgress);
        }
        *self = PaymentState::Submitting;
        Ok(())
    }

    /// Entered from `Submitting` after a local submission, or straight from
    /// `Idle`/`Done` when someone else already broadcast the transaction.
    pub fn await_confirmation(&mut self, signature: Signature) -> AppResult<()> {
        if matches!(self, PaymentState::AwaitingConfirmation { .. }) {
            return Err(AppError::PaymentInProgress);
        }
        *self = PaymentState::AwaitingConfirmation { signature };
        Ok(())
    }

    pub fn finish(&mut self, outcome: ConfirmationOutcome) {
        *self = PaymentState::Done(outcome);
    }

    pub fn reset(&mut self) {
        *self = PaymentState::Idle;
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Idle => "idle",
            PaymentState::Submitting => "submitting",
            PaymentState::AwaitingConfirmation { .. } => "awaiting_confirmation",
            PaymentState::Done(_) => "done",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaymentError;

    #[test]
    fn test_full_lifecycle() {
        let mut state = PaymentState::default();
        let signature = Signature::new_unique();

        state.begin_submission().unwrap();
        assert!(state.is_busy());

        state.await_confirmation(signature).unwrap();
        assert_eq!(state, PaymentState::AwaitingConfirmation { signature });

        state.finish(ConfirmationOutcome::Confirmed);
        assert!(!state.is_busy());
        assert_eq!(state.as_str(), "done");
    }

    #[test]
    fn test_reentry_refused_while_busy() {
        let mut state = PaymentState::default();
        state.begin_submission().unwrap();

        assert!(matches!(state.begin_submission(), Err(AppError::PaymentInProgress)));

        state.await_confirmation(Signature::new_unique()).unwrap();
        assert!(matches!(state.begin_submission(), Err(AppError::PaymentInProgress)));
        assert!(matches!(
            state.await_confirmation(Signature::new_unique()),
            Err(AppError::PaymentInProgress)
        ));
    }

    #[test]
    fn test_restart_after_failure() {
        let mut state = PaymentState::default();
        state.begin_submission().unwrap();
        state.finish(ConfirmationOutcome::Failed(PaymentError::Expired));

        state.begin_submission().unwrap();
        assert_eq!(state, PaymentState::Submitting);

        state.reset();
        assert_eq!(state, PaymentState::Idle);
    }
}
