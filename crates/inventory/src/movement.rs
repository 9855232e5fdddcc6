//! Stock movements: the chronological event history the costing engine folds.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use partida_core::{MovementId, ProductId};

/// What a movement does to stock, with the fields each kind actually carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementDetail {
    /// Goods in at a known unit cost. `quantity > 0`.
    Purchase { quantity: Decimal, unit_cost: Decimal },
    /// Goods out; cost is allocated by the costing method. `quantity > 0`.
    Sale { quantity: Decimal },
    /// Signed stock correction. Positive adds a lot (at `unit_cost`, or the
    /// running average when absent); negative consumes like a sale but is not
    /// counted as cost of sales.
    Adjustment {
        quantity: Decimal,
        unit_cost: Option<Decimal>,
    },
    /// Monetary revaluation with no quantity change. `amount != 0`.
    ValueAdjustment { amount: Decimal },
}

/// One stock event for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub date: NaiveDate,
    pub detail: MovementDetail,
    pub note: Option<String>,
}

impl StockMovement {
    fn new(product_id: ProductId, date: NaiveDate, detail: MovementDetail) -> Self {
        Self {
            id: MovementId::new(),
            product_id,
            date,
            detail,
            note: None,
        }
    }

    pub fn purchase(
        product_id: ProductId,
        date: NaiveDate,
        quantity: Decimal,
        unit_cost: Decimal,
    ) -> Self {
        Self::new(product_id, date, MovementDetail::Purchase { quantity, unit_cost })
    }

    pub fn sale(product_id: ProductId, date: NaiveDate, quantity: Decimal) -> Self {
        Self::new(product_id, date, MovementDetail::Sale { quantity })
    }

    pub fn adjustment(
        product_id: ProductId,
        date: NaiveDate,
        quantity: Decimal,
        unit_cost: Option<Decimal>,
    ) -> Self {
        Self::new(product_id, date, MovementDetail::Adjustment { quantity, unit_cost })
    }

    pub fn value_adjustment(product_id: ProductId, date: NaiveDate, amount: Decimal) -> Self {
        Self::new(product_id, date, MovementDetail::ValueAdjustment { amount })
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
