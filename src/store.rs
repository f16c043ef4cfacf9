//! Append-only ledger store.
//!
//! Records are never rewritten or deleted; the engine derives lot state by
//! aggregating over them. The store assigns `id` and `created_at`, so id
//! order and insertion-time order agree.

use chrono::Utc;
use thiserror::Error;

use crate::model::{NewTransaction, Transaction, TxId};

/// Storage failure during a ledger read or write.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ledger write failed: {0}")]
    Write(String),
    #[error("ledger read failed: {0}")]
    Read(String),
}

/// Interface the engine requires of a ledger store.
///
/// `append_all` is the transactional scope of a withdrawal: the staged
/// records must land all-or-nothing, and durable implementations must give
/// the select-then-append sequence at least snapshot isolation so two
/// concurrent withdrawals cannot both drain the same lot.
pub trait LedgerStore {
    /// Append a single record, assigning its id and timestamp.
    fn append(&mut self, record: NewTransaction) -> Result<Transaction, StoreError>;

    /// Append a batch atomically, in order.
    fn append_all(&mut self, records: Vec<NewTransaction>) -> Result<Vec<Transaction>, StoreError>;

    /// All records in id (insertion) order.
    fn scan(&self) -> Result<Vec<Transaction>, StoreError>;
}

/// In-process ledger backed by a `Vec`.
#[derive(Debug)]
pub struct MemoryLedger {
    records: Vec<Transaction>,
    next_id: TxId,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        MemoryLedger {
            records: Vec::new(),
            next_id: 1,
        }
    }

    fn push(&mut self, record: NewTransaction) -> Transaction {
        let tx = Transaction {
            id: self.next_id,
            amount: record.amount,
            currency: record.currency,
            kind: record.kind,
            source: record.source,
            created_at: Utc::now(),
            expiry_at: record.expiry_at,
            source_tx: record.source_tx,
            description: record.description,
        };
        self.next_id += 1;
        self.records.push(tx.clone());
        tx
    }
}

impl LedgerStore for MemoryLedger {
    fn append(&mut self, record: NewTransaction) -> Result<Transaction, StoreError> {
        Ok(self.push(record))
    }

    fn append_all(&mut self, records: Vec<NewTransaction>) -> Result<Vec<Transaction>, StoreError> {
        // Single-threaded and infallible, so the batch is trivially atomic.
        Ok(records.into_iter().map(|r| self.push(r)).collect())
    }

    fn scan(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(self.records.clone())
    }
}
