use serde::{Deserialize, Serialize};

use crate::sweet::SweetItem;

/// Items at or below this many units (but above zero) count as low stock.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    pub fn from_quantity(quantity: u32) -> Self {
        match quantity {
            0 => StockStatus::OutOfStock,
            q if q <= LOW_STOCK_THRESHOLD => StockStatus::LowStock,
            _ => StockStatus::InStock,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::LowStock => "low_stock",
            StockStatus::InStock => "in_stock",
        }
    }
}

/// Dashboard figures over a catalog snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_items: usize,
    pub total_units: u64,
    /// Sum of `price * quantity`, in cents. Saturates at `u64::MAX`.
    pub total_value: u64,
    pub out_of_stock: usize,
    pub low_stock: usize,
}

impl InventorySummary {
    pub fn from_items(items: &[SweetItem]) -> Self {
        let mut summary = InventorySummary {
            total_items: items.len(),
            ..InventorySummary::default()
        };
        let mut value: u128 = 0;

        for item in items {
            summary.total_units += u64::from(item.quantity());
            value = value.saturating_add(item.stock_value());
            match item.stock_status() {
                StockStatus::OutOfStock => summary.out_of_stock += 1,
                StockStatus::LowStock => summary.low_stock += 1,
                StockStatus::InStock => {}
            }
        }

        summary.total_value = u64::try_from(value).unwrap_or(u64::MAX);
        summary
    }
}
