//! Journal entries and pre-posting validation.
//!
//! Entries are created and persisted by external modules (vouchers, payments,
//! the inflation-adjustment pass); the engine only reads them. The validator
//! is the gatekeeper: an entry must balance and reference only postable
//! accounts before it may be posted.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use partida_core::{AccountId, EntryId, Period, is_within_tolerance};

use crate::chart::Chart;

/// One side of a journal entry. Exactly one of `debit`/`credit` is nonzero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLine {
    pub account_id: AccountId,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl EntryLine {
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
        }
    }
}

/// Which module originated an entry, with that module's fixed fields.
///
/// A closed union instead of an open key/value map: each source carries
/// exactly the fields it defines, so downstream readers cannot silently
/// access a field that was never set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source_type", rename_all = "snake_case")]
pub enum EntrySource {
    Manual,
    Voucher { voucher_number: String },
    Payment { receipt_number: String },
    InflationAdjustment { period: Period },
}

impl Default for EntrySource {
    fn default() -> Self {
        EntrySource::Manual
    }
}

/// A double-entry journal entry: ordered lines, one date, one memo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub date: NaiveDate,
    pub memo: String,
    pub lines: Vec<EntryLine>,
    #[serde(default)]
    pub source: EntrySource,
}

impl JournalEntry {
    pub fn new(date: NaiveDate, memo: impl Into<String>, lines: Vec<EntryLine>) -> Self {
        Self {
            id: EntryId::new(),
            date,
            memo: memo.into(),
            lines,
            source: EntrySource::Manual,
        }
    }

    pub fn with_source(mut self, source: EntrySource) -> Self {
        self.source = source;
        self
    }

    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }
}

/// A single validation failure. An entry can accumulate several.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("entry does not balance: debits minus credits = {diff}")]
    Unbalanced { diff: Decimal },

    #[error("entry has no lines")]
    Empty,

    #[error("line {index}: amounts cannot be negative")]
    NegativeAmount { index: usize },

    #[error("line {index}: a line cannot carry both a debit and a credit")]
    BothSides { index: usize },

    #[error("line {index}: unknown account {account_id}")]
    UnknownAccount { index: usize, account_id: AccountId },

    #[error("line {index}: account {code} is a header account")]
    HeaderAccount { index: usize, code: String },
}

/// Outcome of validating one entry. `diff = Σdebit − Σcredit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: Vec<ValidationError>,
    pub diff: Decimal,
}

/// Validate a proposed entry against the chart. Side-effect free; collects
/// every failure instead of stopping at the first.
pub fn validate(entry: &JournalEntry, chart: &Chart) -> ValidationReport {
    let mut errors = Vec::new();

    if entry.lines.is_empty() {
        errors.push(ValidationError::Empty);
    }

    for (index, line) in entry.lines.iter().enumerate() {
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            errors.push(ValidationError::NegativeAmount { index });
        }
        if line.debit != Decimal::ZERO && line.credit != Decimal::ZERO {
            errors.push(ValidationError::BothSides { index });
        }
        match chart.get(line.account_id) {
            None => errors.push(ValidationError::UnknownAccount {
                index,
                account_id: line.account_id,
            }),
            Some(account) if account.is_header => errors.push(ValidationError::HeaderAccount {
                index,
                code: account.code.clone(),
            }),
            Some(_) => {}
        }
    }

    let diff = entry.total_debit() - entry.total_credit();
    if !is_within_tolerance(diff) {
        errors.push(ValidationError::Unbalanced { diff });
    }

    ValidationReport {
        ok: errors.is_empty(),
        errors,
        diff,
    }
}
