use async_trait::async_trait;
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_config::RpcTransactionConfig,
};
use solana_commitment_config::CommitmentConfig;
use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};
use solana_transaction_status_client_types::{
    option_serializer::OptionSerializer, UiTransactionEncoding, UiTransactionStatusMeta,
    UiTransactionTokenBalance,
};
use std::{collections::HashMap, str::FromStr, time::Duration};
use tracing::{debug, info, trace, warn};

use super::{
    ledger::LedgerClient,
    models::{
        ConfirmationLevel, ConfirmationReport, FreshnessCheckpoint, SignatureStatus,
        TokenBalanceDelta, TransactionRecord,
    },
};
use crate::error::LedgerError;

/// Decides which transport errors are worth a warning.
///
/// Fragments listed here are matched against the error text; matching
/// errors are still logged, but at trace level.
#[derive(Debug, Clone, Default)]
pub struct TransportLogFilter {
    suppressed: Vec<String>,
}

impl TransportLogFilter {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suppressed: fragments
                .into_iter()
                .map(Into::into)
                .filter(|fragment: &String| !fragment.is_empty())
                .collect(),
        }
    }

    pub fn is_suppressed(&self, message: &str) -> bool {
        self.suppressed
            .iter()
            .any(|fragment| message.contains(fragment.as_str()))
    }

    pub fn report(&self, context: &str, message: &str) {
        if self.is_suppressed(message) {
            trace!("Suppressed ledger transport error during {}: {}", context, message);
        } else {
            warn!("Ledger transport error during {}: {}", context, message);
        }
    }
}

#[derive(Debug, Clone)]
pub struct RpcLedgerConfig {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    pub poll_interval: Duration,
    pub log_filter: TransportLogFilter,
}

impl Default for RpcLedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            commitment: CommitmentConfig::confirmed(),
            poll_interval: Duration::from_millis(500),
            log_filter: TransportLogFilter::new(["ws error"]),
        }
    }
}

/// [`LedgerClient`] backed by a Solana JSON-RPC endpoint.
pub struct RpcLedger {
    config: RpcLedgerConfig,
    client: RpcClient,
}

impl RpcLedger {
    pub fn new(config: RpcLedgerConfig) -> Self {
        let client = RpcClient::new_with_commitment(config.rpc_url.clone(), config.commitment);

        info!("Ledger RPC client configured for {}", config.rpc_url);

        Self { config, client }
    }

    fn map_client_error(&self, context: &str, error: ClientError) -> LedgerError {
        let message = error.to_string();
        self.config.log_filter.report(context, &message);

        if is_access_denied(&error, &message) {
            LedgerError::Unavailable(message)
        } else {
            LedgerError::Rpc(message)
        }
    }
}

fn is_access_denied(error: &ClientError, message: &str) -> bool {
    if let ClientErrorKind::Reqwest(inner) = error.kind() {
        if let Some(status) = inner.status() {
            return matches!(status.as_u16(), 403 | 429);
        }
    }

    message.contains("403") || message.contains("429")
}

fn record_from(
    slot: u64,
    block_time: Option<i64>,
    meta: Option<&UiTransactionStatusMeta>,
) -> TransactionRecord {
    TransactionRecord {
        slot,
        block_time,
        err: meta
            .and_then(|meta| meta.err.as_ref())
            .map(|err| err.to_string()),
        token_deltas: meta.map(token_deltas).unwrap_or_default(),
    }
}

fn token_balances(
    balances: &OptionSerializer<Vec<UiTransactionTokenBalance>>,
) -> &[UiTransactionTokenBalance] {
    match balances {
        OptionSerializer::Some(balances) => balances,
        _ => &[],
    }
}

/// Post minus pre balance for every token account the transaction touched.
/// Accounts without a parseable mint or owner are skipped.
fn token_deltas(meta: &UiTransactionStatusMeta) -> Vec<TokenBalanceDelta> {
    let mut accounts: HashMap<u8, (Pubkey, Pubkey, i128)> = HashMap::new();

    for (sign, balances) in [
        (-1, token_balances(&meta.pre_token_balances)),
        (1, token_balances(&meta.post_token_balances)),
    ] {
        for balance in balances {
            let owner = match &balance.owner {
                OptionSerializer::Some(owner) => owner,
                _ => continue,
            };
            let (Ok(mint), Ok(owner), Ok(amount)) = (
                Pubkey::from_str(&balance.mint),
                Pubkey::from_str(owner),
                balance.ui_token_amount.amount.parse::<i128>(),
            ) else {
                continue;
            };

            accounts
                .entry(balance.account_index)
                .or_insert((mint, owner, 0))
                .2 += sign * amount;
        }
    }

    accounts
        .into_values()
        .filter(|(_, _, amount)| *amount != 0)
        .map(|(mint, owner, amount)| TokenBalanceDelta { mint, owner, amount })
        .collect()
}

fn commitment_for(level: ConfirmationLevel) -> CommitmentConfig {
    match level {
        ConfirmationLevel::Processed => CommitmentConfig::processed(),
        ConfirmationLevel::Confirmed => CommitmentConfig::confirmed(),
        ConfirmationLevel::Finalized => CommitmentConfig::finalized(),
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    async fn latest_checkpoint(&self) -> Result<FreshnessCheckpoint, LedgerError> {
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(CommitmentConfig::finalized())
            .await
            .map_err(|e| self.map_client_error("blockhash fetch", e))?;

        debug!(
            "Fetched blockhash {} valid until height {}",
            blockhash, last_valid_block_height
        );

        Ok(FreshnessCheckpoint {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn signature_status(
        &self,
        signature: &Signature,
        search_history: bool,
    ) -> Result<Option<SignatureStatus>, LedgerError> {
        let result = if search_history {
            self.client
                .get_signature_statuses_with_history(&[*signature])
                .await
        } else {
            self.client.get_signature_statuses(&[*signature]).await
        };
        let response = result.map_err(|e| self.map_client_error("signature status", e))?;

        let status = response.value.into_iter().next().flatten().map(|status| {
            let confirmation = if status.satisfies_commitment(CommitmentConfig::finalized()) {
                ConfirmationLevel::Finalized
            } else if status.satisfies_commitment(CommitmentConfig::confirmed()) {
                ConfirmationLevel::Confirmed
            } else {
                ConfirmationLevel::Processed
            };

            SignatureStatus {
                confirmation,
                err: status.err.map(|err| err.to_string()),
            }
        });

        Ok(status)
    }

    async fn transaction_record(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionRecord>, LedgerError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
            ..RpcTransactionConfig::default()
        };

        match self.client.get_transaction_with_config(signature, config).await {
            Ok(confirmed_tx) => Ok(Some(record_from(
                confirmed_tx.slot,
                confirmed_tx.block_time,
                confirmed_tx.transaction.meta.as_ref(),
            ))),
            // The node answers `null` for transactions it has not recorded
            Err(e) if matches!(e.kind(), ClientErrorKind::SerdeJson(_)) => Ok(None),
            Err(e) => Err(self.map_client_error("transaction lookup", e)),
        }
    }

    async fn wait_for_confirmation(
        &self,
        signature: &Signature,
        checkpoint: &FreshnessCheckpoint,
        level: ConfirmationLevel,
    ) -> Result<ConfirmationReport, LedgerError> {
        let target = commitment_for(level);

        loop {
            let response = self
                .client
                .get_signature_statuses(&[*signature])
                .await
                .map_err(|e| self.map_client_error("confirmation wait", e))?;

            if let Some(Some(status)) = response.value.first() {
                if let Some(err) = &status.err {
                    return Ok(ConfirmationReport {
                        err: Some(err.to_string()),
                    });
                }
                if status.satisfies_commitment(target) {
                    return Ok(ConfirmationReport::default());
                }
            }

            let block_height = self
                .client
                .get_block_height()
                .await
                .map_err(|e| self.map_client_error("block height", e))?;

            if block_height > checkpoint.last_valid_block_height {
                return Err(LedgerError::BlockHeightExceeded {
                    signature: signature.to_string(),
                });
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        let signature = self
            .client
            .send_transaction(transaction)
            .await
            .map_err(|e| self.map_client_error("transaction send", e))?;

        info!("Transaction sent: {}", signature);
        Ok(signature)
    }
}
