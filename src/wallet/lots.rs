//! Lot aggregation: the derived view of what remains spendable.
//!
//! Lot state is never stored; it is recomputed from the append-only ledger.
//! Every DEPOSIT (and legacy REMAINDER) record is a lot root, and each
//! WITHDRAW referencing a root reduces its remaining value.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::Amount;
use crate::model::{Currency, PriorityTable, Source, Transaction, TxId, TxKind};

/// A funding lot with spendable value left.
#[derive(Debug, Clone)]
pub struct Lot {
    pub id: TxId,
    pub currency: Currency,
    pub source: Source,
    /// Root amount minus everything withdrawn against it, in minor units.
    pub remaining: Amount,
    pub created_at: DateTime<Utc>,
    pub expiry_at: Option<DateTime<Utc>>,
}

/// Aggregate the ledger into open lots as of `now`.
///
/// Exhausted lots (`remaining == 0`) and lots whose expiry has passed are
/// dropped. Withdrawals referencing an unknown root are ignored rather than
/// conjuring negative lots.
pub fn open_lots(records: &[Transaction], now: DateTime<Utc>) -> Vec<Lot> {
    let mut lots: Vec<Lot> = Vec::new();
    let mut roots: HashMap<TxId, usize> = HashMap::new();

    for record in records {
        match record.kind {
            TxKind::Deposit | TxKind::Remainder => {
                roots.insert(record.id, lots.len());
                lots.push(Lot {
                    id: record.id,
                    currency: record.currency,
                    source: record.source,
                    remaining: record.amount,
                    created_at: record.created_at,
                    expiry_at: record.expiry_at,
                });
            }
            TxKind::Withdraw => {
                if let Some(&idx) = record.source_tx.as_ref().and_then(|id| roots.get(id)) {
                    // withdraw amounts are negative
                    lots[idx].remaining += record.amount;
                }
            }
        }
    }

    lots.retain(|lot| lot.remaining.is_positive() && lot.expiry_at.is_none_or(|e| e >= now));
    lots
}

/// Order candidates for allocation: source priority first, then earliest
/// expiry (`None` last), then oldest funds, with id as the final tiebreak.
pub fn sort_candidates(lots: &mut [Lot], priorities: &PriorityTable) {
    lots.sort_by(|a, b| {
        priorities
            .rank(a.source)
            .cmp(&priorities.rank(b.source))
            .then_with(|| match (a.expiry_at, b.expiry_at) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(
        id: TxId,
        minor: i64,
        kind: TxKind,
        source: Source,
        source_tx: Option<TxId>,
        expiry_at: Option<DateTime<Utc>>,
    ) -> Transaction {
        Transaction {
            id,
            amount: Amount::from_minor(minor),
            currency: Currency::Usd,
            kind,
            source,
            created_at: Utc::now(),
            expiry_at,
            source_tx,
            description: None,
        }
    }

    #[test]
    fn deposit_without_withdrawals_is_fully_open() {
        let now = Utc::now();
        let records = vec![record(1, 10_000, TxKind::Deposit, Source::Cfar, None, None)];
        let lots = open_lots(&records, now);
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].remaining, Amount::from_minor(10_000));
    }

    #[test]
    fn withdrawals_reduce_the_referenced_lot() {
        let now = Utc::now();
        let records = vec![
            record(1, 10_000, TxKind::Deposit, Source::Cfar, None, None),
            record(2, -4_000, TxKind::Withdraw, Source::Cfar, Some(1), None),
            record(3, -1_000, TxKind::Withdraw, Source::Cfar, Some(1), None),
        ];
        let lots = open_lots(&records, now);
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].remaining, Amount::from_minor(5_000));
    }

    #[test]
    fn exhausted_lot_is_dropped() {
        let now = Utc::now();
        let records = vec![
            record(1, 10_000, TxKind::Deposit, Source::Cfar, None, None),
            record(2, -10_000, TxKind::Withdraw, Source::Cfar, Some(1), None),
        ];
        assert!(open_lots(&records, now).is_empty());
    }

    #[test]
    fn expired_lot_is_dropped() {
        let now = Utc::now();
        let records = vec![record(
            1,
            10_000,
            TxKind::Deposit,
            Source::Cfar,
            None,
            Some(now - Duration::days(1)),
        )];
        assert!(open_lots(&records, now).is_empty());
    }

    #[test]
    fn remainder_row_is_a_lot_root() {
        // ledgers written by the previous allocator carry REMAINDER rows
        let now = Utc::now();
        let records = vec![
            record(1, 3_000, TxKind::Remainder, Source::Loyalty, Some(42), None),
            record(2, -1_000, TxKind::Withdraw, Source::Loyalty, Some(1), None),
        ];
        let lots = open_lots(&records, now);
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].remaining, Amount::from_minor(2_000));
    }

    #[test]
    fn withdrawal_with_unknown_root_is_ignored() {
        let now = Utc::now();
        let records = vec![
            record(1, 1_000, TxKind::Deposit, Source::Cfar, None, None),
            record(2, -500, TxKind::Withdraw, Source::Cfar, Some(99), None),
        ];
        let lots = open_lots(&records, now);
        assert_eq!(lots[0].remaining, Amount::from_minor(1_000));
    }

    #[test]
    fn candidates_order_by_priority_then_expiry_then_age() {
        let now = Utc::now();
        let base = now - Duration::days(10);
        let mk = |id, source, expiry, created_offset_days| Lot {
            id,
            currency: Currency::Usd,
            source,
            remaining: Amount::from_minor(100),
            created_at: base + Duration::days(created_offset_days),
            expiry_at: expiry,
        };

        let mut lots = vec![
            mk(1, Source::Cx, None, 0),
            mk(2, Source::Loyalty, None, 0),
            mk(3, Source::Cfar, None, 5),
            mk(4, Source::Cfar, Some(now + Duration::days(30)), 9),
            mk(5, Source::Cfar, Some(now + Duration::days(5)), 9),
            mk(6, Source::Cfar, None, 1),
        ];
        sort_candidates(&mut lots, &PriorityTable::default());

        let ids: Vec<_> = lots.iter().map(|l| l.id).collect();
        // CFAR first: earliest expiry (5, 4), then no-expiry oldest-first (6, 3);
        // then LOYALTY, then CX.
        assert_eq!(ids, vec![5, 4, 6, 3, 2, 1]);
    }

    #[test]
    fn custom_priority_table_reorders_candidates() {
        let now = Utc::now();
        let mk = |id, source| Lot {
            id,
            currency: Currency::Usd,
            source,
            remaining: Amount::from_minor(100),
            created_at: now,
            expiry_at: None,
        };
        let mut lots = vec![mk(1, Source::Cfar), mk(2, Source::Cx)];
        sort_candidates(
            &mut lots,
            &PriorityTable::new([Source::Cx, Source::Loyalty, Source::Cfar]),
        );
        assert_eq!(lots[0].id, 2);
    }
}
