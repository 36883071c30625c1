use config::ConfigError;
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use std::{fmt::Display, str::FromStr, time::Duration};

use crate::{
    conversation::CompletionConfig,
    payment::{PaymentPolicy, RpcLedgerConfig, TransportLogFilter},
    wallet::WalletVerifier,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub solana_rpc_url: String,
    pub ledger_poll_interval: Duration,
    /// Transport errors logged at trace level instead of warn
    pub ledger_suppressed_errors: Vec<String>,
    pub completion: CompletionConfig,
    pub cors_origins: Vec<String>,
    pub chat_rate_limit_per_minute: u32,
    pub payment: PaymentPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = PaymentPolicy::default();
        let completion_defaults = CompletionConfig::default();

        Ok(Self {
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            solana_rpc_url: std::env::var("SOLANA_RPC_URL")
                .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".to_string()),
            ledger_poll_interval: Duration::from_millis(parse_var("LEDGER_POLL_INTERVAL_MS", 500)?),
            ledger_suppressed_errors: list_var("LEDGER_SUPPRESSED_ERRORS")
                .unwrap_or_else(|| vec!["ws error".to_string()]),
            completion: CompletionConfig {
                api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
                base_url: std::env::var("OPENAI_BASE_URL")
                    .unwrap_or(completion_defaults.base_url),
                model: std::env::var("COMPLETION_MODEL").unwrap_or(completion_defaults.model),
                max_tokens: parse_var("COMPLETION_MAX_TOKENS", completion_defaults.max_tokens)?,
                temperature: parse_var("COMPLETION_TEMPERATURE", completion_defaults.temperature)?,
            },
            cors_origins: list_var("CORS_ORIGINS").unwrap_or_else(|| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            }),
            chat_rate_limit_per_minute: parse_var("CHAT_RATE_LIMIT_PER_MINUTE", 30)?,
            payment: PaymentPolicy {
                token_mint: address_var("PAYMENT_TOKEN_MINT", defaults.token_mint)?,
                recipient: address_var("PAYMENT_RECIPIENT", defaults.recipient)?,
                token_decimals: parse_var("PAYMENT_TOKEN_DECIMALS", defaults.token_decimals)?,
                room_fee: parse_var::<Decimal>("ROOM_FEE_TOKENS", defaults.room_fee)?,
                continuation_fee: parse_var::<Decimal>(
                    "CONTINUATION_FEE_TOKENS",
                    defaults.continuation_fee,
                )?,
                continuation_cadence: parse_var("CONTINUATION_CADENCE", defaults.continuation_cadence)?,
                redeem_window: Duration::from_secs(
                    parse_var::<u64>("REDEEM_WINDOW_HOURS", defaults.redeem_window.as_secs() / 3600)?
                        .saturating_mul(3600),
                ),
            },
        })
    }

    pub fn ledger_config(&self) -> RpcLedgerConfig {
        RpcLedgerConfig {
            rpc_url: self.solana_rpc_url.clone(),
            poll_interval: self.ledger_poll_interval,
            log_filter: TransportLogFilter::new(self.ledger_suppressed_errors.iter().cloned()),
            ..RpcLedgerConfig::default()
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::Message(format!("Invalid {} '{}': {}", key, raw, e)))
}

fn address_var(key: &str, default: Pubkey) -> Result<Pubkey, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => WalletVerifier::parse_address(raw.trim())
            .map_err(|e| ConfigError::Message(format!("Invalid {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

/// Comma separated, empty entries dropped. `None` when unset.
fn list_var(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|raw| split_list(&raw))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
