pub mod gate;
pub mod ledger;
pub mod models;
pub mod policy;
pub mod reconciler;
pub mod session;
pub mod solana;
pub mod state;
pub mod submitter;

#[cfg(test)]
pub(crate) mod testing;

pub use gate::PaymentGate;
pub use ledger::LedgerClient;
pub use models::{ConfirmationOutcome, FreshnessCheckpoint, SubmittedTransaction, TransferRequest};
pub use policy::{PaymentKind, PaymentPolicy};
pub use reconciler::Reconciler;
pub use session::{PaymentReceipt, PaymentSession};
pub use solana::{RpcLedger, RpcLedgerConfig, TransportLogFilter};
pub use state::PaymentState;
pub use submitter::TransactionSubmitter;
