//! Command line payer.
//!
//! Usage: `pay [room|continue]`. Signs with the keypair in `SOLANA_PAYER_KEY`
//! (base58), pays the configured fee and waits for the ledger to confirm.

use anyhow::{anyhow, bail, Context};
use persona_rooms::{
    config::Config,
    payment::{PaymentKind, PaymentSession, RpcLedger},
    wallet::{KeypairWallet, Wallet},
};
use solana_sdk::{bs58, signature::Keypair};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,persona_rooms=debug".into()),
        )
        .init();

    let kind: PaymentKind = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "room".to_string())
        .parse()?;

    let config = Config::from_env()?;

    let payer_key = std::env::var("SOLANA_PAYER_KEY").context("SOLANA_PAYER_KEY must be set")?;
    let keypair = parse_payer_key(&payer_key).context("Invalid SOLANA_PAYER_KEY")?;
    let wallet = Arc::new(KeypairWallet::new(keypair));
    let owner = wallet.connect().await?;
    info!("Paying {} from {}", kind.as_str(), owner);

    let ledger = Arc::new(RpcLedger::new(config.ledger_config()));
    let session = PaymentSession::new(ledger, wallet, Arc::new(config.payment.clone()));

    let receipt = session.pay(kind).await?;

    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}

fn parse_payer_key(raw: &str) -> anyhow::Result<Keypair> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("key is empty");
    }

    let bytes = bs58::decode(raw).into_vec().context("key is not base58")?;
    Keypair::try_from(bytes.as_slice()).map_err(|e| anyhow!("key is not a keypair: {}", e))
}
