use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

pub struct WalletVerifier;

impl WalletVerifier {
    /// Parse a base58 Solana address, rejecting obviously malformed input
    /// before handing it to the pubkey parser.
    pub fn parse_address(address: &str) -> AppResult<Pubkey> {
        Self::validate_solana_address(address)?;

        Pubkey::from_str(address)
            .map_err(|_| AppError::InvalidAddress(format!("Invalid Solana address: {}", address)))
    }

    fn validate_solana_address(address: &str) -> AppResult<()> {
        // Basic Solana address validation (base58, ~44 chars)
        if address.len() < 32 || address.len() > 44 {
            return Err(AppError::InvalidAddress(
                "Invalid Solana address length".to_string(),
            ));
        }

        // Check for valid base58 characters
        if !address.chars().all(|c| {
            "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz".contains(c)
        }) {
            return Err(AppError::InvalidAddress(
                "Invalid Solana address: contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}
