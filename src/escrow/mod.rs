pub mod solana;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::AppResult;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Convert a SOL amount to lamports, flooring to the smallest unit.
pub fn sol_to_lamports(sol: Decimal) -> u64 {
    (sol * Decimal::from(LAMPORTS_PER_SOL))
        .floor()
        .to_u64()
        .unwrap_or(0)
}

/// Convert lamports to SOL. Exact: every lamport count is representable.
pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL)
}

/// How a single transfer failed.
///
/// Rejected is conclusive: the ledger refused and no value moved. Timeout is
/// ambiguous: the transfer may have landed, so callers must not retry it
/// blindly within the same run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferErrorKind {
    Rejected,
    Timeout,
}

#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct TransferError {
    pub kind: TransferErrorKind,
    pub message: String,
}

impl TransferError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: TransferErrorKind::Rejected,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: TransferErrorKind::Timeout,
            message: message.into(),
        }
    }
}

/// The contract the payout machinery needs from the escrow wallet: read the
/// balance, send value, nothing else. There is a single shared escrow
/// identity, so transfers must be issued one at a time.
#[async_trait]
pub trait EscrowClient: Send + Sync {
    /// Current escrow balance in SOL.
    async fn balance(&self) -> AppResult<Decimal>;

    /// Send `amount` SOL to `recipient`. Returns the transaction signature
    /// on success; failures are typed outcomes, not application errors.
    async fn send_value(&self, recipient: &str, amount: Decimal) -> Result<String, TransferError>;

    /// The escrow's own address, for reporting.
    fn address(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sol_lamport_round_trip() {
        assert_eq!(sol_to_lamports(dec!(1)), LAMPORTS_PER_SOL);
        assert_eq!(sol_to_lamports(dec!(0.5)), 500_000_000);
        assert_eq!(lamports_to_sol(1_500_000_000), dec!(1.5));
        assert_eq!(lamports_to_sol(1), dec!(0.000000001));
    }

    #[test]
    fn test_sub_lamport_amounts_floor() {
        // anything below one lamport floors away
        assert_eq!(sol_to_lamports(dec!(0.0000000005)), 0);
        assert_eq!(sol_to_lamports(dec!(0.0000000015)), 1);
    }
}
