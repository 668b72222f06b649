//! Authoritative sweet catalog.
//!
//! [`InventoryStore`] is the single entry point for reads and writes. It
//! checks capability grants, validates input, delegates to an
//! [`InventoryBackend`] and publishes an [`InventoryEvent`] once the backend
//! has committed the change.

pub mod in_memory;
pub mod r#trait;
pub mod sqlite;

pub use in_memory::InMemoryBackend;
pub use r#trait::InventoryBackend;
pub use sqlite::SqliteBackend;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;

use sweetshop_auth::{Grant, Permission};
use sweetshop_core::{DomainError, DomainResult, SweetId};
use sweetshop_inventory::{
    sweet::require_positive, InventoryEvent, InventorySummary, NewSweet, SweetFilter, SweetItem,
    SweetPatch,
};

const EVENT_BUFFER: usize = 256;

/// Explicitly owned catalog handle. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct InventoryStore {
    backend: Arc<dyn InventoryBackend>,
    events: broadcast::Sender<InventoryEvent>,
}

impl std::fmt::Debug for InventoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryStore")
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl InventoryStore {
    pub fn new(backend: Arc<dyn InventoryBackend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self { backend, events }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBackend::new()))
    }

    /// Receive change notifications for every committed mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<InventoryEvent> {
        self.events.subscribe()
    }

    pub async fn list(&self) -> DomainResult<Vec<SweetItem>> {
        self.backend.list().await
    }

    /// Items matching every criterion of `filter`, in catalog order.
    pub async fn search(&self, filter: &SweetFilter) -> DomainResult<Vec<SweetItem>> {
        let items = self.backend.list().await?;
        Ok(filter.apply(items))
    }

    pub async fn get(&self, id: SweetId) -> DomainResult<SweetItem> {
        self.backend.get(id).await
    }

    pub async fn summary(&self) -> DomainResult<InventorySummary> {
        let items = self.backend.list().await?;
        Ok(InventorySummary::from_items(&items))
    }

    pub async fn create(&self, grant: &Grant, data: NewSweet) -> DomainResult<SweetItem> {
        check(grant, &Permission::SWEETS_MANAGE)?;
        let item = SweetItem::create(SweetId::new(), data)?;
        let item = self.backend.insert(item).await?;

        tracing::info!(sweet_id = %item.id_typed(), name = item.name(), principal_id = %grant.principal_id(), "sweet created");
        self.publish(InventoryEvent::Created {
            sweet_id: item.id_typed(),
            occurred_at: Utc::now(),
        });
        Ok(item)
    }

    pub async fn update(&self, grant: &Grant, id: SweetId, patch: SweetPatch) -> DomainResult<SweetItem> {
        check(grant, &Permission::SWEETS_MANAGE)?;
        patch.validate()?;
        if patch.is_empty() {
            // Nothing to merge; no change to announce.
            return self.backend.get(id).await;
        }
        let item = self.backend.update(id, &patch).await?;

        tracing::info!(sweet_id = %id, principal_id = %grant.principal_id(), "sweet updated");
        self.publish(InventoryEvent::Updated {
            sweet_id: id,
            occurred_at: Utc::now(),
        });
        Ok(item)
    }

    pub async fn delete(&self, grant: &Grant, id: SweetId) -> DomainResult<()> {
        check(grant, &Permission::SWEETS_MANAGE)?;
        self.backend.delete(id).await?;

        tracing::info!(sweet_id = %id, principal_id = %grant.principal_id(), "sweet deleted");
        self.publish(InventoryEvent::Deleted {
            sweet_id: id,
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    pub async fn purchase(&self, grant: &Grant, id: SweetId, quantity: u32) -> DomainResult<SweetItem> {
        check(grant, &Permission::SWEETS_PURCHASE)?;
        require_positive(quantity)?;

        let item = match self.backend.purchase(id, quantity).await {
            Ok(item) => item,
            Err(err) => {
                tracing::debug!(sweet_id = %id, quantity, error = %err, "purchase rejected");
                return Err(err);
            }
        };

        tracing::info!(sweet_id = %id, quantity, remaining = item.quantity(), "sweet purchased");
        self.publish(InventoryEvent::Purchased {
            sweet_id: id,
            quantity,
            remaining: item.quantity(),
            occurred_at: Utc::now(),
        });
        Ok(item)
    }

    pub async fn restock(&self, grant: &Grant, id: SweetId, quantity: u32) -> DomainResult<SweetItem> {
        check(grant, &Permission::SWEETS_MANAGE)?;
        require_positive(quantity)?;
        let item = self.backend.restock(id, quantity).await?;

        tracing::info!(sweet_id = %id, quantity, remaining = item.quantity(), "sweet restocked");
        self.publish(InventoryEvent::Restocked {
            sweet_id: id,
            quantity,
            remaining: item.quantity(),
            occurred_at: Utc::now(),
        });
        Ok(item)
    }

    /// Insert `catalog` only when the store is empty. Returns how many items were added.
    ///
    /// The emptiness check and the inserts are one backend step, so racing
    /// seeds add the catalog at most once.
    pub async fn seed(&self, grant: &Grant, catalog: Vec<NewSweet>) -> DomainResult<usize> {
        check(grant, &Permission::SWEETS_MANAGE)?;
        let items = catalog
            .into_iter()
            .map(|data| SweetItem::create(SweetId::new(), data))
            .collect::<DomainResult<Vec<_>>>()?;

        let added = self.backend.insert_all_if_empty(items).await?;
        if added.is_empty() {
            tracing::debug!("catalog already populated; skipping seed");
            return Ok(0);
        }

        for item in &added {
            self.publish(InventoryEvent::Created {
                sweet_id: item.id_typed(),
                occurred_at: Utc::now(),
            });
        }
        tracing::info!(added = added.len(), principal_id = %grant.principal_id(), "catalog seeded");
        Ok(added.len())
    }

    fn publish(&self, event: InventoryEvent) {
        tracing::trace!(event = event.event_type(), sweet_id = %event.sweet_id(), "publishing inventory event");
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

fn check(grant: &Grant, required: &Permission) -> DomainResult<()> {
    grant.require(required).map_err(|err| {
        tracing::warn!(principal_id = %grant.principal_id(), required = %required, "grant does not cover operation");
        DomainError::unauthorized(err.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweetshop_auth::{authorize, Principal, PrincipalId, Role};
    use sweetshop_inventory::{demo_catalog, Price};

    fn admin() -> Principal {
        Principal::new(PrincipalId::new(), vec![Role::ADMIN], vec![Permission::WILDCARD])
    }

    fn shopper() -> Principal {
        Principal::new(
            PrincipalId::new(),
            vec![Role::USER],
            vec![Permission::SWEETS_READ, Permission::SWEETS_PURCHASE],
        )
    }

    fn manage() -> Grant {
        authorize(&admin(), &Permission::SWEETS_MANAGE).unwrap()
    }

    fn buy() -> Grant {
        authorize(&shopper(), &Permission::SWEETS_PURCHASE).unwrap()
    }

    fn truffles() -> NewSweet {
        NewSweet::new("Chocolate Truffles", "Chocolate", Price::from_cents(250), 50)
    }

    #[tokio::test]
    async fn truffles_purchase_and_restock() {
        let store = InventoryStore::in_memory();
        let id = store.create(&manage(), truffles()).await.unwrap().id_typed();

        assert_eq!(store.purchase(&buy(), id, 10).await.unwrap().quantity(), 40);
        assert_eq!(
            store.purchase(&buy(), id, 41).await.unwrap_err(),
            DomainError::InsufficientStock {
                requested: 41,
                available: 40
            }
        );
        assert_eq!(store.get(id).await.unwrap().quantity(), 40);
        assert_eq!(store.restock(&manage(), id, 5).await.unwrap().quantity(), 45);
    }

    #[tokio::test]
    async fn purchase_grant_cannot_manage() {
        let store = InventoryStore::in_memory();
        let id = store.create(&manage(), truffles()).await.unwrap().id_typed();

        let err = store.restock(&buy(), id, 5).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
        let err = store.delete(&buy(), id).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
        let err = store.create(&buy(), truffles()).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));

        assert_eq!(store.get(id).await.unwrap().quantity(), 50);
    }

    #[tokio::test]
    async fn manage_grant_cannot_purchase() {
        let store = InventoryStore::in_memory();
        let id = store.create(&manage(), truffles()).await.unwrap().id_typed();

        let err = store.purchase(&manage(), id, 1).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn zero_quantities_are_rejected() {
        let store = InventoryStore::in_memory();
        let id = store.create(&manage(), truffles()).await.unwrap().id_typed();

        assert!(matches!(store.purchase(&buy(), id, 0).await, Err(DomainError::Validation(_))));
        assert!(matches!(store.restock(&manage(), id, 0).await, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn blank_name_is_rejected_before_insert() {
        let store = InventoryStore::in_memory();
        let err = store
            .create(&manage(), NewSweet::new("  ", "Chocolate", Price::ZERO, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_filters_and_empty_filter_lists_everything() {
        let store = InventoryStore::in_memory();
        store.seed(&manage(), demo_catalog()).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(store.search(&SweetFilter::default()).await.unwrap(), all);

        let gummies = store
            .search(&SweetFilter::default().with_category("gummies"))
            .await
            .unwrap();
        assert_eq!(gummies.len(), 1);
        assert_eq!(gummies[0].name(), "Rainbow Gummy Bears");

        let pricey = store
            .search(&SweetFilter::default().with_min_price(Price::from_cents(500)))
            .await
            .unwrap();
        assert!(pricey.is_empty());
    }

    #[tokio::test]
    async fn seed_only_fills_an_empty_store() {
        let store = InventoryStore::in_memory();
        assert_eq!(store.seed(&manage(), demo_catalog()).await.unwrap(), 6);
        assert_eq!(store.seed(&manage(), demo_catalog()).await.unwrap(), 0);

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.total_items, 6);
        assert_eq!(summary.out_of_stock, 1);
    }

    #[tokio::test]
    async fn empty_patch_returns_item_without_event() {
        let store = InventoryStore::in_memory();
        let item = store.create(&manage(), truffles()).await.unwrap();
        let mut rx = store.subscribe();

        let unchanged = store
            .update(&manage(), item.id_typed(), SweetPatch::default())
            .await
            .unwrap();
        assert_eq!(unchanged, item);
        assert!(rx.try_recv().is_err());

        let err = store
            .update(&manage(), SweetId::new(), SweetPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("sweet"));
    }

    async fn racing_seeds_add_catalog_once(store: InventoryStore) {
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let grant = manage();
            handles.push(tokio::spawn(async move { store.seed(&grant, demo_catalog()).await }));
        }

        let mut added = 0;
        for handle in handles {
            added += handle.await.unwrap().unwrap();
        }

        assert_eq!(added, 6);
        assert_eq!(store.list().await.unwrap().len(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_seeds_do_not_duplicate_in_memory() {
        racing_seeds_add_catalog_once(InventoryStore::in_memory()).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_seeds_do_not_duplicate_in_sqlite() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        racing_seeds_add_catalog_once(InventoryStore::new(Arc::new(backend))).await;
    }

    #[tokio::test]
    async fn events_follow_committed_mutations_only() {
        let store = InventoryStore::in_memory();
        let mut rx = store.subscribe();

        let id = store.create(&manage(), truffles()).await.unwrap().id_typed();
        store.purchase(&buy(), id, 60).await.unwrap_err();
        store.purchase(&buy(), id, 10).await.unwrap();
        store.delete(&manage(), id).await.unwrap();

        let created = rx.recv().await.unwrap();
        assert_eq!(created.event_type(), "inventory.sweet.created");
        assert_eq!(created.sweet_id(), id);

        match rx.recv().await.unwrap() {
            InventoryEvent::Purchased {
                sweet_id,
                quantity,
                remaining,
                ..
            } => {
                assert_eq!(sweet_id, id);
                assert_eq!(quantity, 10);
                assert_eq!(remaining, 40);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        assert_eq!(rx.recv().await.unwrap().event_type(), "inventory.sweet.deleted");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn deleted_item_is_gone_for_every_operation() {
        let store = InventoryStore::in_memory();
        let id = store.create(&manage(), truffles()).await.unwrap().id_typed();
        store.delete(&manage(), id).await.unwrap();

        let not_found = DomainError::not_found("sweet");
        assert_eq!(store.get(id).await.unwrap_err(), not_found);
        assert_eq!(store.purchase(&buy(), id, 1).await.unwrap_err(), not_found);
        assert_eq!(store.restock(&manage(), id, 1).await.unwrap_err(), not_found);
        assert_eq!(store.delete(&manage(), id).await.unwrap_err(), not_found);
    }

    async fn concurrent_purchases_never_oversell(store: InventoryStore) {
        let id = store
            .create(&manage(), NewSweet::new("Cotton Candy", "Specialty", Price::from_cents(200), 7))
            .await
            .unwrap()
            .id_typed();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            let grant = buy();
            handles.push(tokio::spawn(async move { store.purchase(&grant, id, 1).await }));
        }

        let mut sold = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => sold += 1,
                Err(DomainError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(sold, 7);
        assert_eq!(store.get(id).await.unwrap().quantity(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn in_memory_backend_never_oversells() {
        concurrent_purchases_never_oversell(InventoryStore::in_memory()).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn sqlite_backend_never_oversells() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        concurrent_purchases_never_oversell(InventoryStore::new(Arc::new(backend))).await;
    }
}
