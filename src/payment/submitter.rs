use solana_sdk::{message::Message, pubkey::Pubkey, transaction::Transaction};
use spl_associated_token_account::get_associated_token_address;
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    ledger::LedgerClient,
    models::{FreshnessCheckpoint, SubmittedTransaction, TransferRequest},
};
use crate::{error::PaymentError, wallet::Wallet};

/// Builds a token transfer and hands it to the wallet for signing.
///
/// No retries here: if the wallet or the ledger refuses, the caller decides
/// whether to submit again.
pub struct TransactionSubmitter {
    ledger: Arc<dyn LedgerClient>,
    wallet: Arc<dyn Wallet>,
}

impl TransactionSubmitter {
    pub fn new(ledger: Arc<dyn LedgerClient>, wallet: Arc<dyn Wallet>) -> Self {
        Self { ledger, wallet }
    }

    pub fn owner(&self) -> Option<Pubkey> {
        self.wallet.owner()
    }

    pub async fn submit(
        &self,
        request: &TransferRequest,
    ) -> Result<SubmittedTransaction, PaymentError> {
        let owner = self.wallet.owner().ok_or(PaymentError::WalletNotConnected)?;

        if request.amount_base_units == 0 {
            return Err(PaymentError::Payment(
                "Transfer amount must be greater than zero".to_string(),
            ));
        }

        if owner != request.sender {
            return Err(PaymentError::Payment(format!(
                "Connected wallet {} is not the transfer sender {}",
                owner, request.sender
            )));
        }

        let checkpoint = self
            .ledger
            .latest_checkpoint()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let transaction = build_transfer_transaction(request, &checkpoint)?;

        info!(
            "Sending transfer of {} base units with blockhash {}",
            request.amount_base_units, checkpoint.blockhash
        );

        let signature = self
            .wallet
            .sign_and_send(transaction, self.ledger.as_ref())
            .await?;

        info!("Transaction sent, signature: {}", signature);

        Ok(SubmittedTransaction {
            signature,
            checkpoint,
        })
    }
}

/// One SPL transfer between the associated token accounts of sender and
/// recipient, paid for by the sender and pinned to `checkpoint`.
pub fn build_transfer_transaction(
    request: &TransferRequest,
    checkpoint: &FreshnessCheckpoint,
) -> Result<Transaction, PaymentError> {
    let source = get_associated_token_address(&request.sender, &request.token_mint);
    let destination = get_associated_token_address(&request.recipient, &request.token_mint);

    debug!("Token accounts: {} -> {}", source, destination);

    let instruction = spl_token::instruction::transfer(
        &spl_token::ID,
        &source,
        &destination,
        &request.sender,
        &[],
        request.amount_base_units,
    )
    .map_err(|e| {
        PaymentError::Payment(format!("Failed to build SPL transfer instruction: {:?}", e))
    })?;

    let mut message = Message::new(&[instruction], Some(&request.sender));
    message.recent_blockhash = checkpoint.blockhash;

    Ok(Transaction::new_unsigned(message))
}
