//! Persistence collaborator for orders and their status history.
//!
//! Stores use optimistic concurrency: every save names the version it read,
//! and the store refuses the write with [`StoreError::Conflict`] if another
//! writer got there first.

mod file;
mod memory;

use std::future::Future;

use tracing::{error, warn};

pub use file::FileStore;
pub use memory::InMemoryStore;

use crate::error::StoreError;
use crate::workflow::{Order, StatusHistoryEntry};

pub trait OrderStore: Send + Sync {
    fn insert_order(&self, order: &Order) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_order(&self, id: &str) -> impl Future<Output = Result<Order, StoreError>> + Send;

    /// Writes `order` if the stored copy is still at `expected_version`.
    ///
    /// The store sets the version to `expected_version + 1` and returns what
    /// it persisted.
    fn save_order_state(
        &self,
        order: &Order,
        expected_version: u64,
    ) -> impl Future<Output = Result<Order, StoreError>> + Send;

    fn append_history(
        &self,
        entry: &StatusHistoryEntry,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// History for an order, oldest first.
    fn get_history(
        &self,
        order_id: &str,
    ) -> impl Future<Output = Result<Vec<StatusHistoryEntry>, StoreError>> + Send;

    /// Persists the new order state together with its history entry.
    ///
    /// The default saves the order, then appends the entry; if the append
    /// fails the previous snapshot is written back before the error is
    /// returned. Stores that can write both in one step should override this.
    fn commit_transition(
        &self,
        previous: &Order,
        next: &Order,
        entry: &StatusHistoryEntry,
    ) -> impl Future<Output = Result<Order, StoreError>> + Send {
        async move {
            let saved = self.save_order_state(next, previous.version).await?;
            if let Err(err) = self.append_history(entry).await {
                warn!(order_id = %previous.id, error = %err, "history append failed, rolling back status");
                if let Err(rollback) = self.save_order_state(previous, saved.version).await {
                    error!(order_id = %previous.id, error = %rollback, "status rollback failed");
                }
                return Err(err);
            }
            Ok(saved)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Actor, HistoryEvent, Status};

    /// Delegates to an in-memory store but refuses every history append,
    /// exercising the compensating default of `commit_transition`.
    struct BrokenHistoryStore {
        inner: InMemoryStore,
    }

    impl OrderStore for BrokenHistoryStore {
        async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
            self.inner.insert_order(order).await
        }

        async fn get_order(&self, id: &str) -> Result<Order, StoreError> {
            self.inner.get_order(id).await
        }

        async fn save_order_state(
            &self,
            order: &Order,
            expected_version: u64,
        ) -> Result<Order, StoreError> {
            self.inner.save_order_state(order, expected_version).await
        }

        async fn append_history(&self, _entry: &StatusHistoryEntry) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("history table locked".into()))
        }

        async fn get_history(&self, order_id: &str) -> Result<Vec<StatusHistoryEntry>, StoreError> {
            self.inner.get_history(order_id).await
        }
    }

    #[tokio::test]
    async fn failed_history_append_restores_previous_status() {
        let store = BrokenHistoryStore {
            inner: InMemoryStore::new(),
        };
        let order = Order::new("p".into(), "c".into(), "Annual checkup letters".into());
        store.insert_order(&order).await.unwrap();

        let mut next = order.clone();
        next.status = Status::Submitted;
        let entry = StatusHistoryEntry::record(
            &next,
            Status::Draft,
            &Actor::customer("c"),
            None,
            HistoryEvent::StatusChange {
                escalation_flagged: false,
            },
        );

        let result = store.commit_transition(&order, &next, &entry).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        let stored = store.get_order(&order.id).await.unwrap();
        assert_eq!(stored.status, Status::Draft);
        assert!(store.get_history(&order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn default_commit_checks_version() {
        let store = BrokenHistoryStore {
            inner: InMemoryStore::new(),
        };
        let order = Order::new("p".into(), "c".into(), "t".into());
        store.insert_order(&order).await.unwrap();

        let mut stale = order.clone();
        stale.version = 7;
        let mut next = order.clone();
        next.status = Status::Cancelled;
        let entry = StatusHistoryEntry::record(
            &next,
            Status::Draft,
            &Actor::customer("c"),
            None,
            HistoryEvent::StatusChange {
                escalation_flagged: false,
            },
        );

        let result = store.commit_transition(&stale, &next, &entry).await;
        assert!(matches!(
            result,
            Err(StoreError::Conflict {
                expected: 7,
                found: 0,
                ..
            })
        ));
    }
}
