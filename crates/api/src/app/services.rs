//! Store wiring and the change stream.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use sweetshop_auth::{authorize, Permission, Principal, PrincipalId, Role};
use sweetshop_core::DomainResult;
use sweetshop_infra::{InventoryStore, SqliteBackend};
use sweetshop_inventory::demo_catalog;

use crate::config::{ApiConfig, StoreKind};

/// Shared services for all handlers.
#[derive(Debug, Clone)]
pub struct AppServices {
    inventory: InventoryStore,
}

impl AppServices {
    pub fn new(inventory: InventoryStore) -> Self {
        Self { inventory }
    }

    pub fn inventory(&self) -> &InventoryStore {
        &self.inventory
    }
}

/// Build the configured store and seed it when asked to.
pub async fn build_services(config: &ApiConfig) -> DomainResult<AppServices> {
    let inventory = match config.store {
        StoreKind::Memory => InventoryStore::in_memory(),
        StoreKind::Sqlite => {
            let backend = SqliteBackend::connect(&config.database_url, 5).await?;
            InventoryStore::new(Arc::new(backend))
        }
    };
    tracing::info!(store = ?config.store, "inventory store ready");

    if config.seed_demo {
        seed_demo_catalog(&inventory).await?;
    }

    Ok(AppServices::new(inventory))
}

/// Seed through the same grant check as any other caller, as a system principal.
async fn seed_demo_catalog(inventory: &InventoryStore) -> DomainResult<usize> {
    let system = Principal::new(PrincipalId::new(), vec![Role::ADMIN], vec![Permission::WILDCARD]);
    let grant = authorize(&system, &Permission::SWEETS_MANAGE)
        .map_err(|e| sweetshop_core::DomainError::unauthorized(e.to_string()))?;
    inventory.seed(&grant, demo_catalog()).await
}

/// SSE stream of inventory change events.
pub fn inventory_sse_stream(
    services: Arc<AppServices>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.inventory().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(event.event_type()).data(data)))
        }
        // Lagged receivers skip what they missed.
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
