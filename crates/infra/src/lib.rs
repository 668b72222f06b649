//! Infrastructure layer: storage backends and the catalog store.

pub mod inventory_store;

pub use inventory_store::{InMemoryBackend, InventoryBackend, InventoryStore, SqliteBackend};
