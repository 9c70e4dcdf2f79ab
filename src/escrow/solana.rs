use async_trait::async_trait;
use rust_decimal::Decimal;
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    message::Message,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{lamports_to_sol, sol_to_lamports, EscrowClient, TransferError};
use crate::error::{AppResult, EscrowError};

#[derive(Debug, Clone)]
pub struct SolanaEscrowConfig {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    pub confirmation_timeout: Duration,
}

impl Default for SolanaEscrowConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            commitment: CommitmentConfig::confirmed(),
            confirmation_timeout: Duration::from_secs(60),
        }
    }
}

/// Escrow wallet client backed by a Solana RPC node. Holds the single shared
/// escrow keypair that signs every payout.
pub struct SolanaEscrowClient {
    client: RpcClient,
    escrow_keypair: Arc<Keypair>,
}

impl SolanaEscrowClient {
    pub fn new(config: SolanaEscrowConfig, escrow_keypair: Keypair) -> Self {
        let client = RpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            config.confirmation_timeout,
            config.commitment,
        );

        Self {
            client,
            escrow_keypair: Arc::new(escrow_keypair),
        }
    }

    /// Build the client from the SOLANA_ESCROW_KEY environment variable
    /// (base58-encoded keypair).
    pub fn from_env(config: SolanaEscrowConfig) -> AppResult<Self> {
        let key = std::env::var("SOLANA_ESCROW_KEY")
            .map_err(|_| EscrowError::InvalidKey("SOLANA_ESCROW_KEY not set".to_string()))?;

        let keypair = Keypair::from_base58_string(&key);
        Ok(Self::new(config, keypair))
    }

    fn classify_send_error(error: impl std::fmt::Display) -> TransferError {
        let message = error.to_string();
        // Ambiguous outcomes must not look conclusive: the transaction may
        // have landed even though confirmation never arrived.
        if message.contains("timed out") || message.contains("timeout") {
            TransferError::timeout(message)
        } else {
            TransferError::rejected(message)
        }
    }
}

#[async_trait]
impl EscrowClient for SolanaEscrowClient {
    async fn balance(&self) -> AppResult<Decimal> {
        let lamports = self
            .client
            .get_balance(&self.escrow_keypair.pubkey())
            .map_err(|e| EscrowError::BalanceUnavailable(e.to_string()))?;

        Ok(lamports_to_sol(lamports))
    }

    async fn send_value(&self, recipient: &str, amount: Decimal) -> Result<String, TransferError> {
        let recipient_pubkey = Pubkey::from_str(recipient)
            .map_err(|_| TransferError::rejected(format!("Invalid recipient address: {}", recipient)))?;

        let lamports = sol_to_lamports(amount);
        if lamports == 0 {
            return Err(TransferError::rejected(format!(
                "Transfer amount rounds to zero lamports: {}",
                amount
            )));
        }

        let recent_blockhash = self
            .client
            .get_latest_blockhash()
            .map_err(|e| Self::classify_send_error(format!("Failed to get blockhash: {}", e)))?;

        let instruction = solana_system_interface::instruction::transfer(
            &self.escrow_keypair.pubkey(),
            &recipient_pubkey,
            lamports,
        );

        let message = Message::new(&[instruction], Some(&self.escrow_keypair.pubkey()));
        let transaction = Transaction::new(&[&*self.escrow_keypair], message, recent_blockhash);

        let signature = self
            .client
            .send_and_confirm_transaction(&transaction)
            .map_err(|e| {
                warn!("Escrow transfer to {} failed: {}", recipient, e);
                Self::classify_send_error(e)
            })?;

        info!("Escrow transfer confirmed: {} SOL -> {} ({})", amount, recipient, signature);
        Ok(signature.to_string())
    }

    fn address(&self) -> String {
        self.escrow_keypair.pubkey().to_string()
    }
}
