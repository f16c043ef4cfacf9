//! Core domain types for the wallet ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::Amount;

/// Ledger record identifier, assigned monotonically by the store.
pub type TxId = u64;

/// Failed parse of a closed enum at the input boundary.
#[derive(Debug, Error)]
#[error("unrecognized {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Gbp];

    fn as_str(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            other => Err(UnknownVariant {
                kind: "currency",
                value: other.to_string(),
            }),
        }
    }
}

/// Funding source of a lot.
///
/// Consumption priority between sources is not fixed here; it lives in
/// [`PriorityTable`] so tests and callers can reorder it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Source {
    /// Refundable credit ("cancel for any reason"); expires one year after deposit.
    Cfar,
    /// Loyalty points.
    Loyalty,
    /// Customer-experience (goodwill) credit.
    Cx,
}

impl Source {
    fn as_str(self) -> &'static str {
        match self {
            Source::Cfar => "CFAR",
            Source::Loyalty => "LOYALTY",
            Source::Cx => "CX",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CFAR" => Ok(Source::Cfar),
            "LOYALTY" => Ok(Source::Loyalty),
            "CX" => Ok(Source::Cx),
            other => Err(UnknownVariant {
                kind: "source",
                value: other.to_string(),
            }),
        }
    }
}

/// Consumption order between funding sources: earlier entries are drained
/// first. Sources missing from the table rank last.
#[derive(Debug, Clone)]
pub struct PriorityTable(Vec<Source>);

impl PriorityTable {
    pub fn new(order: impl Into<Vec<Source>>) -> Self {
        PriorityTable(order.into())
    }

    pub fn rank(&self, source: Source) -> usize {
        self.0
            .iter()
            .position(|&s| s == source)
            .unwrap_or(self.0.len())
    }
}

impl Default for PriorityTable {
    /// Refundable funds before loyalty funds before goodwill credits.
    fn default() -> Self {
        PriorityTable(vec![Source::Cfar, Source::Loyalty, Source::Cx])
    }
}

/// Kind of ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxKind {
    /// Original funding lot.
    Deposit,
    /// Consumption of a lot; always references the lot it drains.
    Withdraw,
    /// Leftover lot written by the previous allocator after a partial
    /// consumption. Never emitted by this engine, but aggregated as a lot
    /// root when present in an existing ledger.
    Remainder,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxKind::Deposit => "DEPOSIT",
            TxKind::Withdraw => "WITHDRAW",
            TxKind::Remainder => "REMAINDER",
        };
        f.write_str(s)
    }
}

/// An immutable ledger record.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: TxId,
    /// Minor units of `currency`; positive for DEPOSIT/REMAINDER, negative
    /// for WITHDRAW.
    pub amount: Amount,
    pub currency: Currency,
    pub kind: TxKind,
    pub source: Source,
    pub created_at: DateTime<Utc>,
    /// The lot is unusable for allocation at or after this instant.
    pub expiry_at: Option<DateTime<Utc>>,
    /// Back-reference to the lot this record was derived from; `None` only
    /// for original deposits (and legacy remainder roots).
    pub source_tx: Option<TxId>,
    pub description: Option<String>,
}

/// A record to append; the store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: Amount,
    pub currency: Currency,
    pub kind: TxKind,
    pub source: Source,
    pub expiry_at: Option<DateTime<Utc>>,
    pub source_tx: Option<TxId>,
    pub description: Option<String>,
}

/// A wallet operation, the input unit of the engine's stream loop.
#[derive(Debug, Clone)]
pub enum WalletOp {
    /// Fund the wallet from `source`, amount in major units.
    Deposit {
        amount: f64,
        currency: Currency,
        source: Source,
    },
    /// Consume lots to cover `amount` (major units) in `currency`.
    Withdraw {
        amount: f64,
        currency: Currency,
        description: Option<String>,
    },
}
