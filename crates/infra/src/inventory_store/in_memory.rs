use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use sweetshop_core::{DomainError, DomainResult, SweetId};
use sweetshop_inventory::{SweetItem, SweetPatch};

use super::r#trait::InventoryBackend;

/// In-memory catalog guarded by a single lock.
///
/// Intended for tests/dev and the default demo server. Lookups are linear,
/// which is fine for shop-sized catalogs.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    items: RwLock<Vec<SweetItem>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, Vec<SweetItem>>> {
        self.items
            .read()
            .map_err(|_| DomainError::storage("inventory lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, Vec<SweetItem>>> {
        self.items
            .write()
            .map_err(|_| DomainError::storage("inventory lock poisoned"))
    }

    /// Run `change` against one item under the write lock.
    fn modify<F>(&self, id: SweetId, change: F) -> DomainResult<SweetItem>
    where
        F: FnOnce(&mut SweetItem) -> DomainResult<()>,
    {
        let mut items = self.write()?;
        let item = items
            .iter_mut()
            .find(|item| item.id_typed() == id)
            .ok_or(DomainError::not_found("sweet"))?;
        change(item)?;
        Ok(item.clone())
    }
}

#[async_trait::async_trait]
impl InventoryBackend for InMemoryBackend {
    async fn list(&self) -> DomainResult<Vec<SweetItem>> {
        Ok(self.read()?.clone())
    }

    async fn get(&self, id: SweetId) -> DomainResult<SweetItem> {
        self.read()?
            .iter()
            .find(|item| item.id_typed() == id)
            .cloned()
            .ok_or(DomainError::not_found("sweet"))
    }

    async fn insert(&self, item: SweetItem) -> DomainResult<SweetItem> {
        let mut items = self.write()?;
        if items.iter().any(|existing| existing.id_typed() == item.id_typed()) {
            return Err(DomainError::conflict(format!(
                "sweet {} already exists",
                item.id_typed()
            )));
        }
        items.push(item.clone());
        Ok(item)
    }

    async fn insert_all_if_empty(&self, items: Vec<SweetItem>) -> DomainResult<Vec<SweetItem>> {
        let mut stored = self.write()?;
        if !stored.is_empty() {
            return Ok(Vec::new());
        }
        stored.extend(items.iter().cloned());
        Ok(items)
    }

    async fn update(&self, id: SweetId, patch: &SweetPatch) -> DomainResult<SweetItem> {
        self.modify(id, |item| {
            *item = item.patched(patch)?;
            Ok(())
        })
    }

    async fn delete(&self, id: SweetId) -> DomainResult<()> {
        let mut items = self.write()?;
        let index = items
            .iter()
            .position(|item| item.id_typed() == id)
            .ok_or(DomainError::not_found("sweet"))?;
        items.remove(index);
        Ok(())
    }

    async fn purchase(&self, id: SweetId, quantity: u32) -> DomainResult<SweetItem> {
        self.modify(id, |item| item.purchase(quantity))
    }

    async fn restock(&self, id: SweetId, quantity: u32) -> DomainResult<SweetItem> {
        self.modify(id, |item| item.restock(quantity))
    }
}
