//! Domain models for Tally

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::validate::{self, RawDataset};

/// A single dated, categorized expense.
///
/// Immutable once loaded. Amounts are non-negative and carried as exact
/// decimals so two-decimal precision survives every aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub category: String,
    pub amount: Decimal,
}

/// One person's spending ledger for a period (e.g. a term or semester).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    /// Unique within a dataset
    pub id: String,
    pub name: String,
    /// Period label, e.g. "Fall 2025"
    pub period: String,
    /// May be zero; utilization is defined as 0 in that case
    pub budget_limit: Decimal,
    /// Order carries no meaning
    pub transactions: Vec<Transaction>,
}

/// A validated, read-only collection of person records.
///
/// Only constructible through validation ([`validate::validate`] or
/// [`Dataset::from_json`]), so every record downstream code sees is
/// structurally complete and has a unique, non-empty id. Record insertion
/// order is preserved for deterministic iteration.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    records: Vec<PersonRecord>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Dataset {
    /// Build from records whose ids are already known to be unique.
    pub(crate) fn from_validated(records: Vec<PersonRecord>) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        Self { records, index }
    }

    /// Parse and validate a JSON-shaped dataset document.
    ///
    /// The caller is responsible for having read the document from
    /// wherever it lives; this library never touches disk or network.
    pub fn from_json(json: &str) -> Result<Dataset> {
        let raw: RawDataset = serde_json::from_str(json)?;
        let dataset = validate::validate(raw)?;
        Ok(dataset)
    }

    /// Look up a record by person id.
    pub fn get(&self, id: &str) -> Option<&PersonRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// All records, in insertion order.
    pub fn records(&self) -> &[PersonRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
