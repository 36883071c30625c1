pub mod keypair;
pub mod verifier;

pub use keypair::KeypairWallet;
pub use verifier::WalletVerifier;

use async_trait::async_trait;
use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};

use crate::{error::PaymentError, payment::ledger::LedgerClient};

/// Wallet capability the payment flow signs through.
///
/// Implementations own the signing key (or a handle to whoever does) and
/// decide whether to approve a transaction. The ledger is passed in so a
/// wallet can broadcast through the same connection the reconciler reads.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Connect and return the owner address
    async fn connect(&self) -> Result<Pubkey, PaymentError>;

    /// Owner address, `None` while disconnected
    fn owner(&self) -> Option<Pubkey>;

    /// Sign `transaction` with its recent blockhash and broadcast it
    async fn sign_and_send(
        &self,
        transaction: Transaction,
        ledger: &dyn LedgerClient,
    ) -> Result<Signature, PaymentError>;
}
