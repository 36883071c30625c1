use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    api::handler::AppState,
    config::Config,
    conversation::{ConversationService, OpenAiClient, RoomRepository},
    error::AppResult,
    payment::{LedgerClient, PaymentGate, RpcLedger},
};

pub fn initialize_app_state(config: &Config) -> AppResult<AppState> {
    info!("Initializing application components ...");

    // One ledger connection shared by every payment check
    let ledger: Arc<dyn LedgerClient> = Arc::new(RpcLedger::new(config.ledger_config()));
    let policy = Arc::new(config.payment.clone());
    let gate = Arc::new(PaymentGate::new(ledger, policy.clone()));
    info!("✅ Payment gate ready on {}", config.solana_rpc_url);

    if config.completion.api_key.is_empty() {
        warn!("⚠️  OPENAI_API_KEY not set - completions will be rejected upstream");
    }
    let completion = Arc::new(OpenAiClient::new(config.completion.clone())?);
    info!("✅ Completion client using model {}", config.completion.model);

    let conversation = Arc::new(ConversationService::new(
        completion,
        RoomRepository::new(),
        config.payment.continuation_cadence,
    ));

    info!(
        "💰 Room fee {} / continuation fee {} every {} turns",
        config.payment.room_fee, config.payment.continuation_fee, config.payment.continuation_cadence
    );

    Ok(AppState {
        conversation,
        gate,
        policy,
    })
}
