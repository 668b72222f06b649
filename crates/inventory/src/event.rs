use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sweetshop_core::SweetId;

/// Change notification emitted after a mutation has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InventoryEvent {
    Created {
        sweet_id: SweetId,
        occurred_at: DateTime<Utc>,
    },
    Updated {
        sweet_id: SweetId,
        occurred_at: DateTime<Utc>,
    },
    Deleted {
        sweet_id: SweetId,
        occurred_at: DateTime<Utc>,
    },
    Purchased {
        sweet_id: SweetId,
        quantity: u32,
        remaining: u32,
        occurred_at: DateTime<Utc>,
    },
    Restocked {
        sweet_id: SweetId,
        quantity: u32,
        remaining: u32,
        occurred_at: DateTime<Utc>,
    },
}

impl InventoryEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::Created { .. } => "inventory.sweet.created",
            InventoryEvent::Updated { .. } => "inventory.sweet.updated",
            InventoryEvent::Deleted { .. } => "inventory.sweet.deleted",
            InventoryEvent::Purchased { .. } => "inventory.sweet.purchased",
            InventoryEvent::Restocked { .. } => "inventory.sweet.restocked",
        }
    }

    pub fn sweet_id(&self) -> SweetId {
        match self {
            InventoryEvent::Created { sweet_id, .. }
            | InventoryEvent::Updated { sweet_id, .. }
            | InventoryEvent::Deleted { sweet_id, .. }
            | InventoryEvent::Purchased { sweet_id, .. }
            | InventoryEvent::Restocked { sweet_id, .. } => *sweet_id,
        }
    }
}
