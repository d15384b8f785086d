use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::{
    db::{load_json, save_json, KeyValueStore, StorageKey},
    error::AppResult,
    models::{AuditEntry, AuditLog},
};

/// Persisted, bounded record of admin actions
pub struct AuditService {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl AuditService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Records an entry at the front of the log and persists it
    pub async fn append(&self, entry: AuditEntry) -> AppResult<()> {
        self.begin().await?.commit(entry).await
    }

    /// Locks and loads the log ahead of the change it will record.
    ///
    /// An unreadable log fails here, before the caller writes anything.
    pub async fn begin(&self) -> AppResult<PendingAudit<'_>> {
        let guard = self.write_lock.lock().await;
        let log: AuditLog = load_json(self.store.as_ref(), StorageKey::AuditLog).await?;
        Ok(PendingAudit {
            store: self.store.as_ref(),
            log,
            _guard: guard,
        })
    }

    /// Entries, most recent first
    pub async fn list(&self) -> AppResult<Vec<AuditEntry>> {
        let log: AuditLog = load_json(self.store.as_ref(), StorageKey::AuditLog).await?;
        Ok(log.entries().to_vec())
    }
}

/// A loaded audit log, locked until its entry is committed or it is dropped
pub struct PendingAudit<'a> {
    store: &'a dyn KeyValueStore,
    log: AuditLog,
    _guard: MutexGuard<'a, ()>,
}

impl PendingAudit<'_> {
    pub async fn commit(mut self, entry: AuditEntry) -> AppResult<()> {
        tracing::info!(
            action = %entry.action,
            admin = %entry.admin,
            details = %entry.details,
            "Admin action recorded"
        );
        self.log.push(entry);

        save_json(self.store, StorageKey::AuditLog, &self.log).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::models::AUDIT_LOG_CAPACITY;

    #[tokio::test]
    async fn test_append_persists_most_recent_first() {
        let store = Arc::new(InMemoryStore::new());
        let service = AuditService::new(store.clone());

        service
            .append(AuditEntry::new("first", "a", "lemany01"))
            .await
            .unwrap();
        service
            .append(AuditEntry::new("second", "b", "lemany01"))
            .await
            .unwrap();

        // A fresh service over the same store sees the persisted log
        let entries = AuditService::new(store).list().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "second");
        assert_eq!(entries[1].action, "first");
    }

    #[tokio::test]
    async fn test_51_appends_drop_the_oldest() {
        let service = AuditService::new(Arc::new(InMemoryStore::new()));

        for i in 0..51 {
            service
                .append(AuditEntry::new(format!("action-{}", i), "", "lemany01"))
                .await
                .unwrap();
        }

        let entries = service.list().await.unwrap();
        assert_eq!(entries.len(), AUDIT_LOG_CAPACITY);
        assert_eq!(entries[0].action, "action-50");
        assert_eq!(entries.last().unwrap().action, "action-1");
        assert!(!entries.iter().any(|e| e.action == "action-0"));
    }

    #[tokio::test]
    async fn test_empty_log() {
        let service = AuditService::new(Arc::new(InMemoryStore::new()));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_begin_fails_on_unreadable_log() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set(&StorageKey::AuditLog.to_string(), "{corrupt".to_string())
            .await
            .unwrap();
        let service = AuditService::new(store);

        assert!(service.begin().await.is_err());
        tokio_test::assert_err!(service.list().await);
    }
}
