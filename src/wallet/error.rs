//! Error types for wallet operations.

use thiserror::Error;

use crate::amount::ValidationError;
use crate::rates::RateError;
use crate::store::StoreError;

/// Top-level error returned by [`Wallet`](super::Wallet) operations.
///
/// Mutation paths abort before any write on validation or rate failures and
/// roll up store failures; read paths degrade instead of propagating.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("exchange rates unavailable: {0}")]
    Rate(#[from] RateError),

    #[error("ledger store failed: {0}")]
    Store(#[from] StoreError),
}
