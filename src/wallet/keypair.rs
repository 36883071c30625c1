use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::info;

use super::Wallet;
use crate::{error::PaymentError, payment::ledger::LedgerClient};

/// Wallet backed by a local keypair. Used by the command line payer.
pub struct KeypairWallet {
    keypair: Arc<Keypair>,
    connected: AtomicBool,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
            connected: AtomicBool::new(false),
        }
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Wallet for KeypairWallet {
    async fn connect(&self) -> Result<Pubkey, PaymentError> {
        self.connected.store(true, Ordering::SeqCst);
        let owner = self.keypair.pubkey();
        info!("🔑 Wallet connected: {}", owner);
        Ok(owner)
    }

    fn owner(&self) -> Option<Pubkey> {
        self.connected
            .load(Ordering::SeqCst)
            .then(|| self.keypair.pubkey())
    }

    async fn sign_and_send(
        &self,
        mut transaction: Transaction,
        ledger: &dyn LedgerClient,
    ) -> Result<Signature, PaymentError> {
        if self.owner().is_none() {
            return Err(PaymentError::WalletNotConnected);
        }

        let recent_blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[self.keypair.as_ref()], recent_blockhash)
            .map_err(|e| PaymentError::UserRejected(e.to_string()))?;

        let signature = ledger.send_transaction(&transaction).await?;
        Ok(signature)
    }
}
