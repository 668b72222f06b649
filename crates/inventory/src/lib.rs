//! Inventory domain module for the sweet shop catalog.
//!
//! Business rules only: items, stock arithmetic, search filters and the
//! dashboard summary. No IO, no HTTP, no storage.

pub mod catalog;
pub mod event;
pub mod filter;
pub mod stock;
pub mod sweet;

pub use catalog::{demo_catalog, SUGGESTED_CATEGORIES};
pub use event::InventoryEvent;
pub use filter::SweetFilter;
pub use stock::{InventorySummary, StockStatus, LOW_STOCK_THRESHOLD};
pub use sweet::{NewSweet, Price, SweetItem, SweetPatch};
