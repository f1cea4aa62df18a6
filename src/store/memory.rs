use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::OrderStore;
use crate::error::StoreError;
use crate::workflow::{Order, StatusHistoryEntry};

#[derive(Debug, Default)]
struct Tables {
    orders: HashMap<String, Order>,
    history: HashMap<String, Vec<StatusHistoryEntry>>,
}

impl Tables {
    fn check_version(&self, id: &str, expected: u64) -> Result<(), StoreError> {
        let stored = self
            .orders
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if stored.version != expected {
            return Err(StoreError::Conflict {
                id: id.to_string(),
                expected,
                found: stored.version,
            });
        }
        Ok(())
    }

    fn put(&mut self, order: &Order, expected: u64) -> Order {
        let mut saved = order.clone();
        saved.version = expected + 1;
        self.orders.insert(saved.id.clone(), saved.clone());
        saved
    }
}

/// Process-local store. Commits happen under one lock, so the status and
/// history writes are atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("order table lock poisoned".into()))
    }
}

impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.orders.contains_key(&order.id) {
            return Err(StoreError::Duplicate(order.id.clone()));
        }
        tables.orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn get_order(&self, id: &str) -> Result<Order, StoreError> {
        self.lock()?
            .orders
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn save_order_state(&self, order: &Order, expected_version: u64) -> Result<Order, StoreError> {
        let mut tables = self.lock()?;
        tables.check_version(&order.id, expected_version)?;
        Ok(tables.put(order, expected_version))
    }

    async fn append_history(&self, entry: &StatusHistoryEntry) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if !tables.orders.contains_key(&entry.order_id) {
            return Err(StoreError::NotFound(entry.order_id.clone()));
        }
        tables
            .history
            .entry(entry.order_id.clone())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn get_history(&self, order_id: &str) -> Result<Vec<StatusHistoryEntry>, StoreError> {
        let tables = self.lock()?;
        if !tables.orders.contains_key(order_id) {
            return Err(StoreError::NotFound(order_id.to_string()));
        }
        Ok(tables.history.get(order_id).cloned().unwrap_or_default())
    }

    async fn commit_transition(
        &self,
        previous: &Order,
        next: &Order,
        entry: &StatusHistoryEntry,
    ) -> Result<Order, StoreError> {
        let mut tables = self.lock()?;
        tables.check_version(&previous.id, previous.version)?;
        let saved = tables.put(next, previous.version);
        tables
            .history
            .entry(entry.order_id.clone())
            .or_default()
            .push(entry.clone());
        Ok(saved)
    }
}
