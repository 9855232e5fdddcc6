//! Monthly price-index table.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use partida_core::Period;

/// One published index value. External, read-only input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    pub period: Period,
    pub value: Decimal,
}

/// Period-keyed lookup over the index series. Later rows win on duplicate
/// periods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexTable {
    values: BTreeMap<Period, Decimal>,
}

impl IndexTable {
    pub fn from_rows(rows: &[IndexRow]) -> Self {
        Self {
            values: rows.iter().map(|row| (row.period, row.value)).collect(),
        }
    }

    pub fn get(&self, period: Period) -> Option<Decimal> {
        self.values.get(&period).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
