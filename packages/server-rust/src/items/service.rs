//! In-memory item storage.
//!
//! Items are keyed by their generated ID. The tenant is recorded on each item
//! but does not partition the store.

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::schemas::{ItemCreate, ItemResponse};

#[derive(Debug, Default)]
pub struct ItemService {
    items: DashMap<Uuid, ItemResponse>,
}

impl ItemService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a validated payload under a fresh ID, stamped with `tenant_id`.
    pub fn create(&self, payload: ItemCreate, tenant_id: &str) -> ItemResponse {
        let item = ItemResponse {
            id: Uuid::new_v4(),
            name: payload.name,
            description: payload.description,
            price: payload.price,
            tenant_id: tenant_id.to_owned(),
            created_at: Utc::now(),
        };
        self.items.insert(item.id, item.clone());
        item
    }

    #[must_use]
    pub fn get(&self, id: &Uuid) -> Option<ItemResponse> {
        self.items.get(id).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
