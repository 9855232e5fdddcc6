//! Ending-inventory reexpression to homogeneous (closing-date) currency.
//!
//! Runs the costing engine, then restates each remaining cost layer from its
//! origin month to the closing period via the index ratio. A missing index is
//! a data gap, not an error: the layer keeps coefficient 1 and the gap is
//! surfaced in `missing_periods`.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use partida_core::{MovementId, Period, ProductId, round_money};
use partida_inventory::{
    CostLayer, CostingConfig, CostingError, CostingMethod, Product, ProductValuation,
    StockMovement, calculate_all_valuations,
};

use crate::index::IndexTable;

/// A cost layer restated to closing-date purchasing power.
///
/// The weighted-average method emits one synthetic layer per product with
/// `blended = true`: its coefficient is the value-weighted blend of the
/// underlying lots, an accepted approximation (a single origin date does not
/// exist for an averaged cost).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomogeneousLayer {
    /// Purchase lot this layer came from; `None` for a blended layer.
    pub movement_id: Option<MovementId>,
    pub date: Option<NaiveDate>,
    pub origin_period: Option<Period>,
    pub closing_period: Period,
    pub quantity: Decimal,
    pub unit_cost_origin: Decimal,
    pub index_origin: Option<Decimal>,
    pub index_closing: Option<Decimal>,
    pub coefficient: Decimal,
    pub unit_cost_homog: Decimal,
    pub total_origin: Decimal,
    pub total_homog: Decimal,
    pub blended: bool,
}

/// One product's restated valuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductReexpression {
    pub product_id: ProductId,
    pub method: CostingMethod,
    pub current_stock: Decimal,
    pub layers: Vec<HomogeneousLayer>,
    pub total_origin: Decimal,
    pub total_homog: Decimal,
}

/// Aggregate ending-inventory valuation in historical and homogeneous
/// currency. `has_indices` is true only when an index table was supplied and
/// every required period resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndingInventoryValuation {
    pub closing_period: Period,
    pub method: CostingMethod,
    pub products: Vec<ProductReexpression>,
    pub total_quantity: Decimal,
    pub total_origin: Decimal,
    pub total_homog: Decimal,
    /// `total_homog − total_origin` (the inflation adjustment, "ajuste").
    pub adjustment: Decimal,
    /// Adjustment as a percentage of the historical total; 0 when the
    /// historical total is 0.
    pub adjustment_pct: Decimal,
    pub missing_periods: Vec<Period>,
    pub has_indices: bool,
}

fn usable_index(indices: &IndexTable, period: Period) -> Option<Decimal> {
    indices.get(period).filter(|v| *v > Decimal::ZERO)
}

fn reexpress_layer(
    layer: &CostLayer,
    closing_period: Period,
    indices: &IndexTable,
    missing: &mut BTreeSet<Period>,
) -> HomogeneousLayer {
    let origin_period = Period::from(layer.date);
    let index_origin = usable_index(indices, origin_period);
    let index_closing = usable_index(indices, closing_period);

    if index_origin.is_none() {
        missing.insert(origin_period);
    }
    if index_closing.is_none() {
        missing.insert(closing_period);
    }

    let coefficient = match (index_origin, index_closing) {
        (Some(origin), Some(closing)) => closing / origin,
        _ => Decimal::ONE,
    };

    let unit_cost_homog = layer.unit_cost * coefficient;
    let total_origin = layer.quantity * layer.unit_cost;
    let total_homog = layer.quantity * unit_cost_homog;

    HomogeneousLayer {
        movement_id: Some(layer.movement_id),
        date: Some(layer.date),
        origin_period: Some(origin_period),
        closing_period,
        quantity: layer.quantity,
        unit_cost_origin: layer.unit_cost,
        index_origin,
        index_closing,
        coefficient,
        unit_cost_homog,
        total_origin,
        total_homog,
        blended: false,
    }
}

/// Weighted average has no single origin date, so the coefficient is blended:
/// every underlying lot is restated individually and the ratio of the sums is
/// applied uniformly to the averaged cost.
fn reexpress_blended(
    valuation: &ProductValuation,
    closing_period: Period,
    indices: &IndexTable,
    missing: &mut BTreeSet<Period>,
) -> HomogeneousLayer {
    let restated: Vec<HomogeneousLayer> = valuation
        .layers
        .iter()
        .map(|layer| reexpress_layer(layer, closing_period, indices, missing))
        .collect();

    let lots_origin: Decimal = restated.iter().map(|l| l.total_origin).sum();
    let lots_homog: Decimal = restated.iter().map(|l| l.total_homog).sum();
    let coefficient = if lots_origin > Decimal::ZERO {
        lots_homog / lots_origin
    } else {
        Decimal::ONE
    };

    let total_origin = valuation.total_value;
    let total_homog = total_origin * coefficient;
    let unit_cost_homog = if valuation.current_stock != Decimal::ZERO {
        total_homog / valuation.current_stock
    } else {
        Decimal::ZERO
    };

    HomogeneousLayer {
        movement_id: None,
        date: None,
        origin_period: None,
        closing_period,
        quantity: valuation.current_stock,
        unit_cost_origin: valuation.average_cost,
        index_origin: None,
        index_closing: None,
        coefficient,
        unit_cost_homog,
        total_origin,
        total_homog,
        blended: true,
    }
}

/// Value the ending inventory in historical and homogeneous currency.
pub fn compute_ending_inventory_valuation(
    products: &[Product],
    movements: &[StockMovement],
    config: CostingConfig,
    closing_period: Period,
    indices: &IndexTable,
) -> Result<EndingInventoryValuation, CostingError> {
    let valuations = calculate_all_valuations(products, movements, config)?;

    let mut missing = BTreeSet::new();
    let mut product_results = Vec::with_capacity(valuations.len());
    let mut total_quantity = Decimal::ZERO;
    let mut total_origin = Decimal::ZERO;
    let mut total_homog = Decimal::ZERO;

    for valuation in &valuations {
        let layers: Vec<HomogeneousLayer> = match config.method {
            CostingMethod::Fifo | CostingMethod::Lifo => valuation
                .layers
                .iter()
                .map(|layer| reexpress_layer(layer, closing_period, indices, &mut missing))
                .collect(),
            CostingMethod::WeightedAverage => {
                if valuation.current_stock == Decimal::ZERO {
                    Vec::new()
                } else {
                    vec![reexpress_blended(
                        valuation,
                        closing_period,
                        indices,
                        &mut missing,
                    )]
                }
            }
        };

        let product_origin: Decimal = layers.iter().map(|l| l.total_origin).sum();
        let product_homog: Decimal = layers.iter().map(|l| l.total_homog).sum();

        total_quantity += valuation.current_stock;
        total_origin += product_origin;
        total_homog += product_homog;

        product_results.push(ProductReexpression {
            product_id: valuation.product_id,
            method: config.method,
            current_stock: valuation.current_stock,
            layers,
            total_origin: product_origin,
            total_homog: product_homog,
        });
    }

    let missing_periods: Vec<Period> = missing.into_iter().collect();
    if !missing_periods.is_empty() {
        tracing::warn!(
            ?missing_periods,
            "price index missing for some periods; coefficient 1 applied"
        );
    }

    let adjustment = total_homog - total_origin;
    let adjustment_pct = if total_origin == Decimal::ZERO {
        Decimal::ZERO
    } else {
        round_money(adjustment / total_origin * Decimal::ONE_HUNDRED)
    };
    let has_indices = !indices.is_empty() && missing_periods.is_empty();

    Ok(EndingInventoryValuation {
        closing_period,
        method: config.method,
        products: product_results,
        total_quantity,
        total_origin,
        total_homog,
        adjustment,
        adjustment_pct,
        missing_periods,
        has_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexRow;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn period(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn indices_2023() -> IndexTable {
        IndexTable::from_rows(&[
            IndexRow { period: period("2023-01"), value: dec!(100) },
            IndexRow { period: period("2023-06"), value: dec!(120) },
            IndexRow { period: period("2023-12"), value: dec!(150) },
        ])
    }

    #[test]
    fn fifo_layer_is_restated_by_the_index_ratio() {
        let product = Product::new("P-001", "Tornillos");
        let movements = vec![StockMovement::purchase(
            product.id,
            date(2023, 1, 10),
            dec!(10),
            dec!(10),
        )];

        let result = compute_ending_inventory_valuation(
            &[product],
            &movements,
            CostingConfig::new(CostingMethod::Fifo),
            period("2023-12"),
            &indices_2023(),
        )
        .unwrap();

        assert!(result.has_indices);
        assert!(result.missing_periods.is_empty());

        let layer = &result.products[0].layers[0];
        assert_eq!(layer.coefficient, dec!(1.5));
        assert_eq!(layer.unit_cost_homog, dec!(15));
        assert_eq!(layer.total_origin, dec!(100));
        assert_eq!(layer.total_homog, dec!(150));

        assert_eq!(result.total_origin, dec!(100));
        assert_eq!(result.total_homog, dec!(150));
        assert_eq!(result.adjustment, dec!(50));
        assert_eq!(result.adjustment_pct, dec!(50.00));
    }

    #[test]
    fn missing_origin_index_keeps_coefficient_one_and_surfaces_the_gap() {
        let product = Product::new("P-001", "Tornillos");
        let movements = vec![
            StockMovement::purchase(product.id, date(2023, 1, 10), dec!(5), dec!(10)),
            // March has no published index.
            StockMovement::purchase(product.id, date(2023, 3, 10), dec!(5), dec!(20)),
        ];

        let result = compute_ending_inventory_valuation(
            &[product],
            &movements,
            CostingConfig::new(CostingMethod::Fifo),
            period("2023-12"),
            &indices_2023(),
        )
        .unwrap();

        assert!(!result.has_indices);
        assert_eq!(result.missing_periods, vec![period("2023-03")]);

        let march_layer = &result.products[0].layers[1];
        assert_eq!(march_layer.coefficient, Decimal::ONE);
        assert_eq!(march_layer.unit_cost_homog, dec!(20));
        // The January layer still resolved.
        assert_eq!(result.products[0].layers[0].coefficient, dec!(1.5));
    }

    #[test]
    fn missing_closing_index_is_recorded_too() {
        let product = Product::new("P-001", "Tornillos");
        let movements = vec![StockMovement::purchase(
            product.id,
            date(2023, 1, 10),
            dec!(5),
            dec!(10),
        )];

        let result = compute_ending_inventory_valuation(
            &[product],
            &movements,
            CostingConfig::new(CostingMethod::Fifo),
            period("2024-03"),
            &indices_2023(),
        )
        .unwrap();

        assert!(!result.has_indices);
        assert_eq!(result.missing_periods, vec![period("2024-03")]);
        assert_eq!(result.adjustment, Decimal::ZERO);
    }

    #[test]
    fn weighted_average_gets_one_blended_layer() {
        let product = Product::new("P-001", "Tornillos");
        let movements = vec![
            StockMovement::purchase(product.id, date(2023, 1, 10), dec!(10), dec!(5)),
            StockMovement::purchase(product.id, date(2023, 6, 10), dec!(10), dec!(8)),
        ];

        let result = compute_ending_inventory_valuation(
            &[product],
            &movements,
            CostingConfig::new(CostingMethod::WeightedAverage),
            period("2023-12"),
            &indices_2023(),
        )
        .unwrap();

        let layers = &result.products[0].layers;
        assert_eq!(layers.len(), 1);
        let blended = &layers[0];
        assert!(blended.blended);
        assert_eq!(blended.quantity, dec!(20));
        assert_eq!(blended.unit_cost_origin, dec!(6.5));
        // Lots restate to 50×1.5 + 80×1.25 = 175 over an origin of 130.
        assert_eq!(blended.total_origin, dec!(130));
        assert_eq!(round_money(blended.total_homog), dec!(175.00));
        assert_eq!(round_money(blended.unit_cost_homog), dec!(8.75));
        assert_eq!(round_money(result.adjustment), dec!(45.00));
        assert_eq!(result.adjustment_pct, dec!(34.62));
    }

    #[test]
    fn empty_index_table_means_no_homogeneous_figures() {
        let product = Product::new("P-001", "Tornillos");
        let movements = vec![StockMovement::purchase(
            product.id,
            date(2023, 1, 10),
            dec!(10),
            dec!(10),
        )];

        let result = compute_ending_inventory_valuation(
            &[product],
            &movements,
            CostingConfig::new(CostingMethod::Fifo),
            period("2023-12"),
            &IndexTable::default(),
        )
        .unwrap();

        assert!(!result.has_indices);
        assert_eq!(result.adjustment, Decimal::ZERO);
        assert_eq!(result.adjustment_pct, Decimal::ZERO);
    }

    #[test]
    fn totals_aggregate_across_products() {
        let alfa = Product::new("A", "Alfa");
        let beta = Product::new("B", "Beta");
        let movements = vec![
            StockMovement::purchase(alfa.id, date(2023, 1, 5), dec!(10), dec!(10)),
            StockMovement::purchase(beta.id, date(2023, 6, 5), dec!(4), dec!(30)),
        ];

        let result = compute_ending_inventory_valuation(
            &[alfa, beta],
            &movements,
            CostingConfig::new(CostingMethod::Fifo),
            period("2023-12"),
            &indices_2023(),
        )
        .unwrap();

        assert_eq!(result.total_quantity, dec!(14));
        assert_eq!(result.total_origin, dec!(220));
        // 100×1.5 + 120×1.25
        assert_eq!(result.total_homog, dec!(300));
        assert_eq!(result.adjustment, dec!(80));
        assert_eq!(result.adjustment_pct, dec!(36.36));
    }

    #[test]
    fn products_without_stock_contribute_nothing() {
        let product = Product::new("P-001", "Tornillos");
        let movements = vec![
            StockMovement::purchase(product.id, date(2023, 1, 10), dec!(10), dec!(10)),
            StockMovement::sale(product.id, date(2023, 2, 10), dec!(10)),
        ];

        let result = compute_ending_inventory_valuation(
            &[product],
            &movements,
            CostingConfig::new(CostingMethod::WeightedAverage),
            period("2023-12"),
            &indices_2023(),
        )
        .unwrap();

        assert!(result.products[0].layers.is_empty());
        assert_eq!(result.total_origin, Decimal::ZERO);
        assert_eq!(result.adjustment_pct, Decimal::ZERO);
        assert!(result.has_indices);
    }
}
