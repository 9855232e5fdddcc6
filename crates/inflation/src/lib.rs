//! Homogeneous-currency reexpression (ajuste por inflación).
//!
//! Reexpresses historical inventory costs to closing-date purchasing power
//! using monthly price indices, and builds the normal-side-aware correcting
//! journal entries for reexpressed accounts. Pure domain logic; index tables
//! are supplied read-only by the caller.

pub mod adjustment;
pub mod index;
pub mod reexpression;

pub use adjustment::{ResultAccount, reexpression_adjustment_entry};
pub use index::{IndexRow, IndexTable};
pub use reexpression::{
    EndingInventoryValuation, HomogeneousLayer, ProductReexpression,
    compute_ending_inventory_valuation,
};
