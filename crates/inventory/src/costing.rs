//! Inventory costing engine: FIFO, LIFO and weighted-average valuation.
//!
//! Each product's movements are folded strictly in chronological order into
//! open cost layers, a consumption audit trail and totals. The engine is a
//! pure function of the movement history; nothing is cached between calls.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use partida_core::{MovementId, ProductId};

use crate::movement::{MovementDetail, StockMovement};
use crate::product::Product;

/// Cost allocation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostingMethod {
    Fifo,
    Lifo,
    WeightedAverage,
}

/// Policy for consuming more stock than is on hand.
///
/// `AllowNegative` is only meaningful under weighted average (a layered
/// method has no layer to carry negative quantities); FIFO/LIFO reject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversellPolicy {
    Reject,
    AllowNegative,
    Clamp,
}

impl Default for OversellPolicy {
    fn default() -> Self {
        OversellPolicy::Reject
    }
}

/// Costing configuration supplied by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostingConfig {
    pub method: CostingMethod,
    #[serde(default)]
    pub oversell: OversellPolicy,
}

impl CostingConfig {
    pub fn new(method: CostingMethod) -> Self {
        Self {
            method,
            oversell: OversellPolicy::default(),
        }
    }

    pub fn with_oversell(mut self, oversell: OversellPolicy) -> Self {
        self.oversell = oversell;
        self
    }
}

/// An open lot of stock at a specific historical unit cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLayer {
    pub date: NaiveDate,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub movement_id: MovementId,
}

impl CostLayer {
    pub fn total_cost(&self) -> Decimal {
        self.quantity * self.unit_cost
    }
}

/// Audit record of one chunk of consumption.
///
/// `source_movement_id` names the purchase lot the chunk came from; it is
/// `None` under weighted average, where consumption is priced at the running
/// average rather than a specific lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumedLot {
    pub movement_id: MovementId,
    pub source_movement_id: Option<MovementId>,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub cost: Decimal,
}

/// Per-product valuation, recomputed fully from the movement history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductValuation {
    pub product_id: ProductId,
    pub method: CostingMethod,
    pub current_stock: Decimal,
    /// Open layers (FIFO/LIFO: drive allocation; weighted average:
    /// informational lot view only).
    pub layers: Vec<CostLayer>,
    /// Consumption history for audit drill-down.
    pub consumed: Vec<ConsumedLot>,
    pub average_cost: Decimal,
    pub total_value: Decimal,
    /// Cost of sales accumulated from `Sale` movements (negative adjustments
    /// consume stock but are not cost of sales).
    pub cogs_total: Decimal,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CostingError {
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("movement {movement_id}: insufficient stock (requested {requested}, available {available})")]
    InsufficientStock {
        movement_id: MovementId,
        requested: Decimal,
        available: Decimal,
    },

    #[error("movement {movement_id}: negative stock is not supported under a layered method")]
    NegativeStockNotSupported { movement_id: MovementId },

    #[error("movement {movement_id}: value adjustment requires stock on hand")]
    ValueAdjustmentWithoutStock { movement_id: MovementId },

    #[error("movement {movement_id}: {reason}")]
    InvalidMovement {
        movement_id: MovementId,
        reason: String,
    },
}

struct Engine {
    config: CostingConfig,
    stock: Decimal,
    layers: Vec<CostLayer>,
    consumed: Vec<ConsumedLot>,
    average: Decimal,
    cogs: Decimal,
}

impl Engine {
    fn new(config: CostingConfig) -> Self {
        Self {
            config,
            stock: Decimal::ZERO,
            layers: Vec::new(),
            consumed: Vec::new(),
            average: Decimal::ZERO,
            cogs: Decimal::ZERO,
        }
    }

    fn layered(&self) -> bool {
        matches!(self.config.method, CostingMethod::Fifo | CostingMethod::Lifo)
    }

    fn layers_value(&self) -> Decimal {
        self.layers.iter().map(CostLayer::total_cost).sum()
    }

    fn apply(&mut self, movement: &StockMovement) -> Result<(), CostingError> {
        match &movement.detail {
            MovementDetail::Purchase { quantity, unit_cost } => {
                if *quantity <= Decimal::ZERO {
                    return Err(invalid(movement.id, "purchase quantity must be positive"));
                }
                if *unit_cost < Decimal::ZERO {
                    return Err(invalid(movement.id, "unit cost cannot be negative"));
                }
                self.receive(movement.id, movement.date, *quantity, *unit_cost);
                Ok(())
            }
            MovementDetail::Sale { quantity } => {
                if *quantity <= Decimal::ZERO {
                    return Err(invalid(movement.id, "sale quantity must be positive"));
                }
                self.consume(movement.id, *quantity, true)
            }
            MovementDetail::Adjustment { quantity, unit_cost } => {
                self.adjust(movement.id, movement.date, *quantity, *unit_cost)
            }
            MovementDetail::ValueAdjustment { amount } => {
                self.revalue(movement.id, *amount)
            }
        }
    }

    fn receive(&mut self, movement_id: MovementId, date: NaiveDate, quantity: Decimal, unit_cost: Decimal) {
        if !self.layered() {
            let new_stock = self.stock + quantity;
            self.average = if new_stock == Decimal::ZERO {
                unit_cost
            } else {
                (self.stock * self.average + quantity * unit_cost) / new_stock
            };
        }
        self.layers.push(CostLayer {
            date,
            quantity,
            unit_cost,
            movement_id,
        });
        self.stock += quantity;
    }

    fn consume(&mut self, movement_id: MovementId, quantity: Decimal, is_sale: bool) -> Result<(), CostingError> {
        let available = if self.layered() {
            self.layers.iter().map(|l| l.quantity).sum()
        } else {
            self.stock
        };

        let actual = if quantity > available {
            match self.config.oversell {
                OversellPolicy::Reject => {
                    return Err(CostingError::InsufficientStock {
                        movement_id,
                        requested: quantity,
                        available,
                    });
                }
                OversellPolicy::Clamp => available.max(Decimal::ZERO),
                OversellPolicy::AllowNegative => {
                    if self.layered() {
                        return Err(CostingError::NegativeStockNotSupported { movement_id });
                    }
                    quantity
                }
            }
        } else {
            quantity
        };

        if self.layered() {
            self.consume_layers(movement_id, actual, is_sale);
        } else {
            if actual != Decimal::ZERO {
                let cost = actual * self.average;
                if is_sale {
                    self.cogs += cost;
                }
                self.consumed.push(ConsumedLot {
                    movement_id,
                    source_movement_id: None,
                    quantity: actual,
                    unit_cost: self.average,
                    cost,
                });
                // Keep the informational lot view in step with the stock.
                self.drain_display_layers(actual);
            }
            self.stock -= actual;
        }
        Ok(())
    }

    /// FIFO consumes from the head, LIFO from the tail; a chunk spanning
    /// several layers produces one audit record per layer touched.
    fn consume_layers(&mut self, movement_id: MovementId, quantity: Decimal, is_sale: bool) {
        let mut remaining = quantity;
        while remaining > Decimal::ZERO {
            let index = match self.config.method {
                CostingMethod::Fifo => 0,
                CostingMethod::Lifo => self.layers.len() - 1,
                CostingMethod::WeightedAverage => unreachable!("layered consumption only"),
            };
            let layer = &mut self.layers[index];
            let take = layer.quantity.min(remaining);
            layer.quantity -= take;
            let unit_cost = layer.unit_cost;
            let source_movement_id = layer.movement_id;
            let exhausted = layer.quantity == Decimal::ZERO;
            remaining -= take;

            let cost = take * unit_cost;
            if is_sale {
                self.cogs += cost;
            }
            self.consumed.push(ConsumedLot {
                movement_id,
                source_movement_id: Some(source_movement_id),
                quantity: take,
                unit_cost,
                cost,
            });

            if exhausted {
                self.layers.remove(index);
            }
        }
        self.stock -= quantity;
    }

    /// Weighted average: trim the informational lot view front-first so the
    /// remaining lot quantities still add up to the stock on hand.
    fn drain_display_layers(&mut self, quantity: Decimal) {
        let mut remaining = quantity;
        while remaining > Decimal::ZERO && !self.layers.is_empty() {
            let layer = &mut self.layers[0];
            let take = layer.quantity.min(remaining);
            layer.quantity -= take;
            remaining -= take;
            if layer.quantity == Decimal::ZERO {
                self.layers.remove(0);
            }
        }
    }

    fn adjust(
        &mut self,
        movement_id: MovementId,
        date: NaiveDate,
        quantity: Decimal,
        unit_cost: Option<Decimal>,
    ) -> Result<(), CostingError> {
        if quantity == Decimal::ZERO {
            return Err(invalid(movement_id, "adjustment quantity cannot be zero"));
        }
        if quantity > Decimal::ZERO {
            let cost = match unit_cost {
                Some(cost) if cost >= Decimal::ZERO => cost,
                Some(_) => return Err(invalid(movement_id, "unit cost cannot be negative")),
                None => {
                    if self.stock <= Decimal::ZERO {
                        return Err(invalid(
                            movement_id,
                            "adjustment-in without unit cost requires stock on hand",
                        ));
                    }
                    self.current_average()
                }
            };
            self.receive(movement_id, date, quantity, cost);
            Ok(())
        } else {
            self.consume(movement_id, -quantity, false)
        }
    }

    /// Monetary revaluation: spreads `amount` over the stock on hand without
    /// changing quantities. Layered methods prorate across open layers by
    /// their remaining value; weighted average folds it into the average.
    fn revalue(&mut self, movement_id: MovementId, amount: Decimal) -> Result<(), CostingError> {
        if amount == Decimal::ZERO {
            return Err(invalid(movement_id, "value adjustment amount cannot be zero"));
        }
        if self.stock <= Decimal::ZERO {
            return Err(CostingError::ValueAdjustmentWithoutStock { movement_id });
        }

        if self.layered() {
            let current = self.layers_value();
            if current == Decimal::ZERO {
                return Err(invalid(
                    movement_id,
                    "cannot prorate a value adjustment over zero-value layers",
                ));
            }
            let factor = Decimal::ONE + amount / current;
            if factor < Decimal::ZERO {
                return Err(invalid(
                    movement_id,
                    "write-down exceeds the inventory value",
                ));
            }
            for layer in &mut self.layers {
                layer.unit_cost *= factor;
            }
        } else {
            let new_average = (self.stock * self.average + amount) / self.stock;
            if new_average < Decimal::ZERO {
                return Err(invalid(
                    movement_id,
                    "write-down exceeds the inventory value",
                ));
            }
            self.average = new_average;
        }
        Ok(())
    }

    fn current_average(&self) -> Decimal {
        if self.layered() {
            if self.stock > Decimal::ZERO {
                self.layers_value() / self.stock
            } else {
                Decimal::ZERO
            }
        } else {
            self.average
        }
    }

    fn finish(self, product_id: ProductId) -> ProductValuation {
        let (average_cost, total_value) = if self.layered() {
            let total = self.layers_value();
            let average = if self.stock > Decimal::ZERO {
                total / self.stock
            } else {
                Decimal::ZERO
            };
            (average, total)
        } else {
            (self.average, self.stock * self.average)
        };

        ProductValuation {
            product_id,
            method: self.config.method,
            current_stock: self.stock,
            layers: self.layers,
            consumed: self.consumed,
            average_cost,
            total_value,
            cogs_total: self.cogs,
        }
    }
}

fn invalid(movement_id: MovementId, reason: &str) -> CostingError {
    CostingError::InvalidMovement {
        movement_id,
        reason: reason.to_string(),
    }
}

/// Value one product from its movement history. Movements belonging to other
/// products are ignored; processing order is chronological (ties keep input
/// order).
pub fn calculate_valuation(
    product: &Product,
    movements: &[StockMovement],
    config: CostingConfig,
) -> Result<ProductValuation, CostingError> {
    let mut own: Vec<&StockMovement> = movements
        .iter()
        .filter(|m| m.product_id == product.id)
        .collect();
    own.sort_by_key(|m| m.date);

    let mut engine = Engine::new(config);
    for movement in own {
        engine.apply(movement)?;
    }
    Ok(engine.finish(product.id))
}

/// Value every product. A movement referencing a product outside `products`
/// is a fatal reference error, never silently skipped.
pub fn calculate_all_valuations(
    products: &[Product],
    movements: &[StockMovement],
    config: CostingConfig,
) -> Result<Vec<ProductValuation>, CostingError> {
    for movement in movements {
        if !products.iter().any(|p| p.id == movement.product_id) {
            return Err(CostingError::ProductNotFound(movement.product_id));
        }
    }

    products
        .iter()
        .map(|product| calculate_valuation(product, movements, config))
        .collect()
}
