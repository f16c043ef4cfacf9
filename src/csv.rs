use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::model::{Currency, Source, Transaction, TxId, TxKind, UnknownVariant, WalletOp};

/// Errors that can occur when parsing csv rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized operation '{op}'")]
    UnrecognizedOp { line: usize, op: String },

    #[error("line {line}: {op} missing {field}")]
    MissingField {
        line: usize,
        op: &'static str,
        field: &'static str,
    },

    #[error("line {line}: {source}")]
    Unknown { line: usize, source: UnknownVariant },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    op: String,
    amount: Option<f64>,
    currency: Option<String>,
    source: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct OutputRow {
    id: TxId,
    r#type: TxKind,
    amount: String,
    currency: Currency,
    source: Source,
    source_tx: Option<TxId>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    expiry_at: Option<DateTime<Utc>>,
}

fn require<T>(
    value: Option<T>,
    line: usize,
    op: &'static str,
    field: &'static str,
) -> Result<T, CsvError> {
    value.ok_or(CsvError::MissingField { line, op, field })
}

/// Read wallet operations from a csv file
pub fn read_operations(
    path: impl AsRef<Path>,
) -> impl Iterator<Item = Result<WalletOp, CsvError>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .expect("failed to open csv file");

    reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            match row.op.as_str() {
                "deposit" => {
                    let amount = require(row.amount, line, "deposit", "amount")?;
                    let currency = require(row.currency, line, "deposit", "currency")?
                        .parse()
                        .map_err(|source| CsvError::Unknown { line, source })?;
                    let source = require(row.source, line, "deposit", "source")?
                        .parse()
                        .map_err(|source| CsvError::Unknown { line, source })?;
                    Ok(WalletOp::Deposit {
                        amount,
                        currency,
                        source,
                    })
                }
                "withdraw" => {
                    let amount = require(row.amount, line, "withdraw", "amount")?;
                    let currency = require(row.currency, line, "withdraw", "currency")?
                        .parse()
                        .map_err(|source| CsvError::Unknown { line, source })?;
                    Ok(WalletOp::Withdraw {
                        amount,
                        currency,
                        description: row.description,
                    })
                }
                other => Err(CsvError::UnrecognizedOp {
                    line,
                    op: other.to_string(),
                }),
            }
        })
}

/// Write ledger records to stdout in csv format, amounts in major units
pub fn write_transactions(records: &[Transaction]) {
    let stdout = io::stdout();
    let mut writer = csv::Writer::from_writer(stdout.lock());

    for tx in records {
        let row = OutputRow {
            id: tx.id,
            r#type: tx.kind,
            amount: tx.amount.to_string(),
            currency: tx.currency,
            source: tx.source,
            source_tx: tx.source_tx,
            description: tx.description.clone(),
            created_at: tx.created_at,
            expiry_at: tx.expiry_at,
        };
        writer.serialize(&row).expect("failed to write csv row");
    }

    writer.flush().expect("failed to flush csv writer");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Currency, Source};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const HEADER: &str = "op,amount,currency,source,description\n";

    #[test]
    fn read_deposit() {
        let file = write_csv(&format!("{HEADER}deposit,100.00,USD,CFAR,\n"));
        let results: Vec<_> = read_operations(file.path()).collect();
        assert_eq!(results.len(), 1);

        let op = results.into_iter().next().unwrap().unwrap();
        match op {
            WalletOp::Deposit {
                amount,
                currency,
                source,
            } => {
                assert_eq!(amount, 100.0);
                assert_eq!(currency, Currency::Usd);
                assert_eq!(source, Source::Cfar);
            }
            _ => panic!("expected deposit"),
        }
    }

    #[test]
    fn read_withdraw_with_description() {
        let file = write_csv(&format!("{HEADER}withdraw,40.00,EUR,,team lunch\n"));
        let results: Vec<_> = read_operations(file.path()).collect();
        assert_eq!(results.len(), 1);

        let op = results.into_iter().next().unwrap().unwrap();
        match op {
            WalletOp::Withdraw {
                amount,
                currency,
                description,
            } => {
                assert_eq!(amount, 40.0);
                assert_eq!(currency, Currency::Eur);
                assert_eq!(description.as_deref(), Some("team lunch"));
            }
            _ => panic!("expected withdraw"),
        }
    }

    #[test]
    fn read_withdraw_without_description() {
        let file = write_csv(&format!("{HEADER}withdraw,40.00,EUR,,\n"));
        let op = read_operations(file.path()).next().unwrap().unwrap();
        match op {
            WalletOp::Withdraw { description, .. } => assert!(description.is_none()),
            _ => panic!("expected withdraw"),
        }
    }

    #[test]
    fn read_with_whitespace() {
        let file = write_csv("op, amount, currency, source, description\ndeposit, 10.0, GBP, LOYALTY,\n");
        let results: Vec<_> = read_operations(file.path()).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[test]
    fn read_returns_error_for_unknown_op() {
        let file = write_csv(&format!("{HEADER}transfer,10.0,USD,CFAR,\n"));
        let results: Vec<_> = read_operations(file.path()).collect();
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, CsvError::UnrecognizedOp { line: 2, .. }));
    }

    #[test]
    fn read_returns_error_for_missing_amount() {
        let file = write_csv(&format!("{HEADER}deposit,,USD,CFAR,\n"));
        let results: Vec<_> = read_operations(file.path()).collect();
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(
            err,
            CsvError::MissingField {
                line: 2,
                field: "amount",
                ..
            }
        ));
    }

    #[test]
    fn read_returns_error_for_missing_source_on_deposit() {
        let file = write_csv(&format!("{HEADER}deposit,10.0,USD,,\n"));
        let results: Vec<_> = read_operations(file.path()).collect();
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(
            err,
            CsvError::MissingField {
                line: 2,
                field: "source",
                ..
            }
        ));
    }

    #[test]
    fn read_returns_error_for_unknown_currency_or_source() {
        let file = write_csv(&format!(
            "{HEADER}deposit,10.0,JPY,CFAR,\ndeposit,10.0,USD,BONUS,\n"
        ));
        let results: Vec<_> = read_operations(file.path()).collect();
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            CsvError::Unknown { line: 2, .. }
        ));
        assert!(matches!(
            results[1].as_ref().unwrap_err(),
            CsvError::Unknown { line: 3, .. }
        ));
    }
}
