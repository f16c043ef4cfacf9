//! Wallet ledger engine.
//!
//! Tracks a multi-currency balance made of funded lots and resolves
//! withdrawals by consuming lots in source-priority and temporal order,
//! converting currencies through an exchange-rate feed. All state is
//! derived from the append-only ledger; nothing is ever mutated in place.

use std::collections::BTreeMap;

use chrono::{Months, Utc};
use tokio_stream::{Stream, StreamExt};
use tracing::{error, info};

use crate::Amount;
use crate::model::{
    Currency, NewTransaction, PriorityTable, Source, Transaction, TxKind, WalletOp,
};
use crate::rates::RateProvider;
use crate::store::LedgerStore;

mod lots;
pub use lots::{Lot, open_lots, sort_candidates};

mod error;
pub use error::WalletError;

/// The wallet engine, generic over its ledger store and rate feed.
pub struct Wallet<S, R> {
    store: S,
    rates: R,
    priorities: PriorityTable,
}

/// Public API
impl<S: LedgerStore, R: RateProvider> Wallet<S, R> {
    pub fn new(store: S, rates: R, priorities: PriorityTable) -> Self {
        Wallet {
            store,
            rates,
            priorities,
        }
    }

    /// Record a funding lot. `amount` is in major units of `currency`.
    ///
    /// Refundable (CFAR) lots expire one year after deposit.
    pub fn deposit(
        &mut self,
        amount: f64,
        currency: Currency,
        source: Source,
    ) -> Result<Transaction, WalletError> {
        let amount = Amount::from_major(amount)?;
        let expiry_at = match source {
            Source::Cfar => Some(Utc::now() + Months::new(12)),
            _ => None,
        };
        let tx = self.store.append(NewTransaction {
            amount,
            currency,
            kind: TxKind::Deposit,
            source,
            expiry_at,
            source_tx: None,
            description: None,
        })?;
        Ok(tx)
    }

    /// Consume open lots to cover `amount` (major units of `currency`),
    /// most-preferred source first, earliest-expiring and oldest funds first
    /// within a source.
    ///
    /// Requesting more than is available is not an error: every open lot is
    /// drained and the shortfall stays unallocated. Returns the WITHDRAW
    /// records written, all appended in one atomic batch.
    pub fn withdraw(
        &mut self,
        amount: f64,
        currency: Currency,
        description: Option<String>,
    ) -> Result<Vec<Transaction>, WalletError> {
        let requested = Amount::from_major(amount)?;
        let table = self.rates.fetch_rates(currency)?;
        let records = self.store.scan()?;

        let mut candidates = open_lots(&records, Utc::now());
        sort_candidates(&mut candidates, &self.priorities);

        let description =
            description.unwrap_or_else(|| format!("Withdrawal of {requested} {currency}"));

        let mut remaining = requested.minor();
        let mut staged = Vec::new();
        for lot in &candidates {
            if remaining <= 0 {
                break;
            }
            // requested-currency remainder, expressed in the lot's currency
            let converted = table.from_base(remaining, lot.currency)?;
            let consume = converted.min(lot.remaining.minor());
            if consume <= 0 {
                continue;
            }
            staged.push(NewTransaction {
                amount: Amount::from_minor(-consume),
                currency: lot.currency,
                kind: TxKind::Withdraw,
                source: lot.source,
                expiry_at: None,
                source_tx: Some(lot.id),
                description: Some(description.clone()),
            });
            remaining -= table.to_base(consume, lot.currency)?;
        }

        let written = self.store.append_all(staged)?;
        Ok(written)
    }

    /// Current spendable balance, converted into `currency` minor units.
    pub fn balance(&self, currency: Currency) -> Result<Amount, WalletError> {
        let table = self.rates.fetch_rates(currency)?;
        let records = self.store.scan()?;
        let mut total = 0i64;
        for lot in open_lots(&records, Utc::now()) {
            total += table.to_base(lot.remaining.minor(), lot.currency)?;
        }
        Ok(Amount::from_minor(total))
    }

    /// Spendable balance per funding source, converted into `currency`.
    /// Sources with no open lots are absent from the map.
    pub fn breakdown(&self, currency: Currency) -> Result<BTreeMap<Source, Amount>, WalletError> {
        let table = self.rates.fetch_rates(currency)?;
        let records = self.store.scan()?;
        let mut per_source = BTreeMap::new();
        for lot in open_lots(&records, Utc::now()) {
            let converted = table.to_base(lot.remaining.minor(), lot.currency)?;
            *per_source.entry(lot.source).or_insert(Amount::default()) +=
                Amount::from_minor(converted);
        }
        Ok(per_source)
    }

    /// The full ledger, most recent first.
    ///
    /// Degrades to an empty list on store failure so display callers stay
    /// available; mutation paths never swallow errors this way.
    pub fn transactions(&self) -> Vec<Transaction> {
        match self.store.scan() {
            Ok(mut records) => {
                records.sort_by(|a, b| b.id.cmp(&a.id));
                records
            }
            Err(e) => {
                error!(reason = %e, "ledger scan failed, returning empty listing");
                Vec::new()
            }
        }
    }

    /// Apply a single wallet operation, logging the outcome.
    pub fn apply(&mut self, op: WalletOp) -> Result<(), WalletError> {
        match op {
            WalletOp::Deposit {
                amount,
                currency,
                source,
            } => {
                let result = self.deposit(amount, currency, source);
                Self::log_result("deposit", amount, currency, &result);
                result.map(|_| ())
            }
            WalletOp::Withdraw {
                amount,
                currency,
                description,
            } => {
                let result = self.withdraw(amount, currency, description);
                Self::log_result("withdraw", amount, currency, &result);
                result.map(|_| ())
            }
        }
    }

    /// Drain a stream of wallet operations.
    ///
    /// A failed operation is logged and skipped; it never stops the engine.
    pub async fn run(&mut self, mut stream: impl Stream<Item = WalletOp> + Unpin) {
        while let Some(op) = stream.next().await {
            let _ = self.apply(op);
        }
    }
}

/// Private API
impl<S, R> Wallet<S, R> {
    fn log_result<T>(
        op: &'static str,
        amount: f64,
        currency: Currency,
        result: &Result<T, WalletError>,
    ) {
        match result {
            Ok(_) => {
                info!(amount, currency = %currency, "{op} applied");
            }
            Err(e) => {
                info!(amount, currency = %currency, reason = %e, "{op} skipped");
            }
        }
    }
}
