use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::OrderStore;
use crate::error::StoreError;
use crate::workflow::{Order, StatusHistoryEntry};

const DOCUMENT_NAME: &str = "orders.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    orders: BTreeMap<String, Order>,
    #[serde(default)]
    history: BTreeMap<String, Vec<StatusHistoryEntry>>,
}

/// Keeps every order and its history in one JSON document.
///
/// Each write replaces the whole document through a temp file and a rename,
/// so a commit lands completely or not at all. A single process-wide lock
/// serializes access; the store is not meant to be shared between processes.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Opens (or prepares) the store under `dir`.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        Ok(Self {
            path: dir.join(DOCUMENT_NAME),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Document, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Document::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn persist(&self, doc: &Document) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(doc)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), orders = doc.orders.len(), "order document written");
        Ok(())
    }
}

fn check_version(doc: &Document, id: &str, expected: u64) -> Result<(), StoreError> {
    let stored = doc
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

fn put(doc: &mut Document, order: &Order, expected: u64) -> Order {
    let mut saved = order.clone();
    saved.version = expected + 1;
    doc.orders.insert(saved.id.clone(), saved.clone());
    saved
}

impl OrderStore for FileStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        if doc.orders.contains_key(&order.id) {
            return Err(StoreError::Duplicate(order.id.clone()));
        }
        doc.orders.insert(order.id.clone(), order.clone());
        self.persist(&doc).await
    }

    async fn get_order(&self, id: &str) -> Result<Order, StoreError> {
        let _guard = self.lock.lock().await;
        self.load()
            .await?
            .orders
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn save_order_state(&self, order: &Order, expected_version: u64) -> Result<Order, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        check_version(&doc, &order.id, expected_version)?;
        let saved = put(&mut doc, order, expected_version);
        self.persist(&doc).await?;
        Ok(saved)
    }

    async fn append_history(&self, entry: &StatusHistoryEntry) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        if !doc.orders.contains_key(&entry.order_id) {
            return Err(StoreError::NotFound(entry.order_id.clone()));
        }
        doc.history
            .entry(entry.order_id.clone())
            .or_default()
            .push(entry.clone());
        self.persist(&doc).await
    }

    async fn get_history(&self, order_id: &str) -> Result<Vec<StatusHistoryEntry>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        if !doc.orders.contains_key(order_id) {
            return Err(StoreError::NotFound(order_id.to_string()));
        }
        Ok(doc.history.remove(order_id).unwrap_or_default())
    }

    async fn commit_transition(
        &self,
        previous: &Order,
        next: &Order,
        entry: &StatusHistoryEntry,
    ) -> Result<Order, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        check_version(&doc, &previous.id, previous.version)?;
        let saved = put(&mut doc, next, previous.version);
        doc.history
            .entry(entry.order_id.clone())
            .or_default()
            .push(entry.clone());
        self.persist(&doc).await?;
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Actor, HistoryEvent, Status};
    use tempfile::TempDir;

    #[tokio::test]
    async fn survives_reopen() {
        let dir = TempDir::new().unwrap();
        let order = Order::new("practice-9".into(), "cust-9".into(), "Lab results".into());
        {
            let store = FileStore::open(dir.path()).await.unwrap();
            store.insert_order(&order).await.unwrap();

            let mut next = order.clone();
            next.status = Status::Submitted;
            let entry = StatusHistoryEntry::record(
                &next,
                Status::Draft,
                &Actor::customer("cust-9"),
                Some("ready".into()),
                HistoryEvent::StatusChange {
                    escalation_flagged: false,
                },
            );
            store.commit_transition(&order, &next, &entry).await.unwrap();
        }

        let store = FileStore::open(dir.path()).await.unwrap();
        let stored = store.get_order(&order.id).await.unwrap();
        assert_eq!(stored.status, Status::Submitted);
        assert_eq!(stored.version, 1);
        let history = store.get_history(&order.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].comments.as_deref(), Some("ready"));
    }

    #[tokio::test]
    async fn empty_directory_has_no_orders() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("nested")).await.unwrap();
        assert!(matches!(
            store.get_order("o-1").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn version_conflicts_are_detected() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let order = Order::new("p".into(), "c".into(), "t".into());
        store.insert_order(&order).await.unwrap();

        let mut next = order.clone();
        next.status = Status::Cancelled;
        store.save_order_state(&next, 0).await.unwrap();
        assert!(matches!(
            store.save_order_state(&next, 0).await,
            Err(StoreError::Conflict { found: 1, .. })
        ));
    }

    #[tokio::test]
    async fn corrupt_document_surfaces_json_error() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        tokio::fs::write(store.path(), b"{not json").await.unwrap();
        assert!(matches!(
            store.get_order("o-1").await,
            Err(StoreError::Json(_))
        ));
    }
}
