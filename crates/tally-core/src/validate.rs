//! Structural validation of raw dataset documents
//!
//! The ingestion boundary accepts loose, `Option`-shaped records so that a
//! missing field is reported by the validator with its record and
//! transaction index instead of surfacing as an opaque deserializer error.
//! Validation is all-or-nothing: the first defect rejects the whole
//! dataset, and only a fully validated [`Dataset`] is ever handed to the
//! metrics engine. The engine does not re-validate.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::ValidationError;
use crate::models::{Dataset, PersonRecord, Transaction};

/// Unvalidated dataset document, straight out of the deserializer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDataset {
    pub records: Option<Vec<RawPersonRecord>>,
}

/// Unvalidated person record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPersonRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub budget_limit: Option<Decimal>,
    #[serde(default)]
    pub transactions: Option<Vec<RawTransaction>>,
}

/// Unvalidated transaction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Validate a raw dataset and convert it into a typed [`Dataset`].
///
/// Checks run in a fixed order, short-circuiting on the first failure:
///
/// 1. the records collection exists;
/// 2. every record has a non-empty `id`, non-empty `name`, and a defined,
///    non-negative `budgetLimit`, with no duplicate ids;
/// 3. every record has a transactions collection (possibly empty);
/// 4. every transaction has a parseable ISO `date`, a non-empty
///    `category`, and a defined, non-negative `amount` (zero is fine).
///
/// There is no partial acceptance: any failure rejects the whole dataset.
pub fn validate(raw: RawDataset) -> Result<Dataset, ValidationError> {
    let raw_records = raw.records.ok_or(ValidationError::MissingRecords)?;

    // Identity fields and id uniqueness
    let mut seen_ids: HashMap<&str, usize> = HashMap::new();
    for (i, record) in raw_records.iter().enumerate() {
        let id = require_text(record.id.as_deref(), i, "id")?;
        require_text(record.name.as_deref(), i, "name")?;
        let budget = record.budget_limit.ok_or(ValidationError::Record {
            record: i,
            field: "budgetLimit",
        })?;
        if budget.is_sign_negative() && !budget.is_zero() {
            return Err(ValidationError::RecordValue {
                record: i,
                field: "budgetLimit",
                value: budget.to_string(),
            });
        }
        if seen_ids.insert(id, i).is_some() {
            return Err(ValidationError::DuplicateId {
                record: i,
                id: id.to_string(),
            });
        }
    }

    // Transactions collection present (an empty one is fine)
    for (i, record) in raw_records.iter().enumerate() {
        if record.transactions.is_none() {
            return Err(ValidationError::Record {
                record: i,
                field: "transactions",
            });
        }
    }

    // Transaction fields, building the typed records as we go
    let mut records = Vec::with_capacity(raw_records.len());
    for (i, record) in raw_records.into_iter().enumerate() {
        records.push(build_record(i, record)?);
    }

    tracing::debug!(records = records.len(), "dataset validated");
    Ok(Dataset::from_validated(records))
}

fn build_record(i: usize, raw: RawPersonRecord) -> Result<PersonRecord, ValidationError> {
    let missing = |field| ValidationError::Record { record: i, field };
    let id = raw.id.ok_or_else(|| missing("id"))?;
    let name = raw.name.ok_or_else(|| missing("name"))?;
    let budget_limit = raw.budget_limit.ok_or_else(|| missing("budgetLimit"))?;
    let raw_transactions = raw.transactions.ok_or_else(|| missing("transactions"))?;

    let mut transactions = Vec::with_capacity(raw_transactions.len());
    for (j, tx) in raw_transactions.into_iter().enumerate() {
        transactions.push(build_transaction(i, j, tx)?);
    }

    Ok(PersonRecord {
        id,
        name,
        period: raw.period.unwrap_or_default(),
        budget_limit,
        transactions,
    })
}

fn build_transaction(
    i: usize,
    j: usize,
    raw: RawTransaction,
) -> Result<Transaction, ValidationError> {
    let missing = |field| ValidationError::Transaction {
        record: i,
        transaction: j,
        field,
    };

    let date_text = raw.date.ok_or_else(|| missing("date"))?;
    let date: NaiveDate = date_text
        .parse()
        .map_err(|_| ValidationError::TransactionValue {
            record: i,
            transaction: j,
            field: "date",
            value: date_text.clone(),
        })?;

    let category = raw.category.ok_or_else(|| missing("category"))?;
    if category.trim().is_empty() {
        return Err(missing("category"));
    }

    let amount = raw.amount.ok_or_else(|| missing("amount"))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::TransactionValue {
            record: i,
            transaction: j,
            field: "amount",
            value: amount.to_string(),
        });
    }

    Ok(Transaction {
        date,
        category,
        amount,
    })
}

fn require_text<'a>(
    value: Option<&'a str>,
    record: usize,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ValidationError::Record { record, field }),
    }
}
