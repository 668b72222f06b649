use sweetshop_core::{DomainResult, SweetId};
use sweetshop_inventory::{SweetItem, SweetPatch};

/// Storage boundary for the sweet catalog.
///
/// Implementations own the authoritative collection and must make every
/// mutating method a single atomic read-modify-write: two concurrent
/// purchases against the same item may never both observe the
/// pre-decrement stock. Callers always receive owned copies.
///
/// Backends do not check authorization; [`super::InventoryStore`] does that
/// before delegating.
#[async_trait::async_trait]
pub trait InventoryBackend: Send + Sync {
    /// All items in insertion order.
    async fn list(&self) -> DomainResult<Vec<SweetItem>>;

    async fn get(&self, id: SweetId) -> DomainResult<SweetItem>;

    /// Append a new item. `Conflict` if its id is already present.
    async fn insert(&self, item: SweetItem) -> DomainResult<SweetItem>;

    /// Append `items` only if the catalog is empty, as one atomic step.
    /// Returns the inserted items, or nothing when the catalog was populated.
    async fn insert_all_if_empty(&self, items: Vec<SweetItem>) -> DomainResult<Vec<SweetItem>>;

    /// Merge `patch` into the stored item. The patch has been validated.
    async fn update(&self, id: SweetId, patch: &SweetPatch) -> DomainResult<SweetItem>;

    async fn delete(&self, id: SweetId) -> DomainResult<()>;

    /// Decrement stock by `quantity` (> 0), or fail with `InsufficientStock`
    /// leaving the item unchanged.
    async fn purchase(&self, id: SweetId, quantity: u32) -> DomainResult<SweetItem>;

    /// Increment stock by `quantity` (> 0).
    async fn restock(&self, id: SweetId, quantity: u32) -> DomainResult<SweetItem>;
}
