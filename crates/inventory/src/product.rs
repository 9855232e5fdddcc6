//! Product master data.

use serde::{Deserialize, Serialize};

use partida_core::ProductId;

/// A stocked product (bien de cambio). Identity plus labelling only; all
/// valuation state is derived from the movement history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub code: String,
    pub name: String,
}

impl Product {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ProductId::new(),
            code: code.into(),
            name: name.into(),
        }
    }
}
