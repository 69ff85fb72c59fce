//! Datastore router: primary store when reachable, in-memory fallback otherwise

use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

use super::document::{DocumentStore, Filter, FindOptions, StoreError};
use super::memory::MemoryStore;

/// Which store is currently serving requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Primary,
    Fallback,
}

/// What a write does when a configured primary is unreachable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Fail with [`StoreError::Unavailable`]
    PrimaryOnly,
    /// Redirect the write to the fallback store
    AllowFallback,
}

/// Reads go primary-first and fall back on any error; writes follow the
/// caller's [`WritePolicy`]. Without a configured primary everything is
/// served from memory.
#[derive(Clone)]
pub struct Datastore {
    primary: Option<Arc<dyn DocumentStore>>,
    fallback: Arc<MemoryStore>,
    timeout: Duration,
}

/// Run a read on the primary, repeating it on the fallback when the
/// primary is down or the operation fails.
macro_rules! read_with_fallback {
    ($self:ident, $op:literal, $collection:expr, |$store:ident| $call:expr) => {{
        if let Some($store) = $self.reachable_primary().await {
            match $self.bounded($call).await {
                Ok(value) => return Ok(value),
                Err(e) => tracing::warn!(
                    collection = $collection,
                    operation = $op,
                    error = %e,
                    "Primary read failed, serving from fallback store"
                ),
            }
        }
        let $store: &dyn DocumentStore = $self.fallback.as_ref();
        $call.await
    }};
}

impl Datastore {
    pub fn new(
        primary: Option<Arc<dyn DocumentStore>>,
        fallback: Arc<MemoryStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            timeout,
        }
    }

    /// Memory-only datastore
    pub fn in_memory(fallback: MemoryStore) -> Self {
        Self::new(None, Arc::new(fallback), Duration::from_secs(5))
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn fallback(&self) -> &MemoryStore {
        &self.fallback
    }

    async fn bounded<T>(&self, op: impl Future<Output = Result<T, StoreError>>) -> Result<T, StoreError> {
        tokio::time::timeout(self.timeout, op)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }

    /// Liveness check against the primary
    pub async fn primary_alive(&self) -> bool {
        match &self.primary {
            Some(primary) => match self.bounded(primary.ping()).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(backend = primary.name(), error = %e, "Primary datastore ping failed");
                    false
                }
            },
            None => false,
        }
    }

    pub async fn backend(&self) -> Backend {
        if self.primary_alive().await {
            Backend::Primary
        } else {
            Backend::Fallback
        }
    }

    async fn reachable_primary(&self) -> Option<&dyn DocumentStore> {
        if self.primary_alive().await {
            self.primary.as_deref()
        } else {
            None
        }
    }

    /// The primary when reachable, otherwise whatever the policy allows
    pub async fn writer(&self, collection: &str, policy: WritePolicy) -> Result<&dyn DocumentStore, StoreError> {
        let Some(primary) = self.primary.as_deref() else {
            return Ok(self.fallback.as_ref());
        };
        if self.primary_alive().await {
            return Ok(primary);
        }
        match policy {
            WritePolicy::AllowFallback => {
                tracing::warn!(collection, "Primary unreachable, writing to fallback store");
                Ok(self.fallback.as_ref())
            }
            WritePolicy::PrimaryOnly => Err(StoreError::Unavailable(format!(
                "primary datastore unreachable, refusing write to {}",
                collection
            ))),
        }
    }

    pub async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError> {
        read_with_fallback!(self, "find", collection, |store| store.find(collection, filter, options))
    }

    pub async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>, StoreError> {
        read_with_fallback!(self, "find_one", collection, |store| store.find_one(collection, filter))
    }

    pub async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        read_with_fallback!(self, "count", collection, |store| store.count(collection, filter))
    }

    /// Read from the store a write under `policy` would use, without fallback
    pub async fn find_one_for_write(
        &self,
        collection: &str,
        filter: &Filter,
        policy: WritePolicy,
    ) -> Result<Option<Value>, StoreError> {
        let store = self.writer(collection, policy).await?;
        self.bounded(store.find_one(collection, filter)).await
    }

    pub async fn find_for_write(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
        policy: WritePolicy,
    ) -> Result<Vec<Value>, StoreError> {
        let store = self.writer(collection, policy).await?;
        self.bounded(store.find(collection, filter, options)).await
    }

    pub async fn count_for_write(
        &self,
        collection: &str,
        filter: &Filter,
        policy: WritePolicy,
    ) -> Result<u64, StoreError> {
        let store = self.writer(collection, policy).await?;
        self.bounded(store.count(collection, filter)).await
    }

    pub async fn insert_one(&self, collection: &str, doc: Value, policy: WritePolicy) -> Result<(), StoreError> {
        let store = self.writer(collection, policy).await?;
        self.bounded(store.insert_one(collection, doc)).await
    }

    pub async fn insert_one_capped(
        &self,
        collection: &str,
        doc: Value,
        scope: &Filter,
        max: u64,
        policy: WritePolicy,
    ) -> Result<bool, StoreError> {
        let store = self.writer(collection, policy).await?;
        self.bounded(store.insert_one_capped(collection, doc, scope, max)).await
    }

    pub async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Map<String, Value>,
        policy: WritePolicy,
    ) -> Result<Option<Value>, StoreError> {
        let store = self.writer(collection, policy).await?;
        self.bounded(store.update_one(collection, filter, patch)).await
    }

    pub async fn delete_one(&self, collection: &str, filter: &Filter, policy: WritePolicy) -> Result<bool, StoreError> {
        let store = self.writer(collection, policy).await?;
        self.bounded(store.delete_one(collection, filter)).await
    }

    /// Create primary indexes; errors when no primary is reachable
    pub async fn ensure_primary_indexes(&self) -> Result<(), StoreError> {
        let primary = self
            .reachable_primary()
            .await
            .ok_or_else(|| StoreError::Unavailable("no reachable primary datastore".to_string()))?;
        self.bounded(primary.ensure_indexes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::document::CASE_STUDIES;
    use async_trait::async_trait;
    use serde_json::json;

    /// Primary whose every call fails
    struct DownStore;

    #[async_trait]
    impl DocumentStore for DownStore {
        fn name(&self) -> &'static str {
            "down"
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn find(&self, _: &str, _: &Filter, _: &FindOptions) -> Result<Vec<Value>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn find_one(&self, _: &str, _: &Filter) -> Result<Option<Value>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn insert_one(&self, _: &str, _: Value) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn insert_one_capped(&self, _: &str, _: Value, _: &Filter, _: u64) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn update_one(&self, _: &str, _: &Filter, _: Map<String, Value>) -> Result<Option<Value>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn delete_one(&self, _: &str, _: &Filter) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn count(&self, _: &str, _: &Filter) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn ensure_indexes(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    /// Primary that answers pings but fails reads
    struct FlakyStore;

    #[async_trait]
    impl DocumentStore for FlakyStore {
        fn name(&self) -> &'static str {
            "flaky"
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
        async fn find(&self, _: &str, _: &Filter, _: &FindOptions) -> Result<Vec<Value>, StoreError> {
            Err(StoreError::Unavailable("read reset".into()))
        }
        async fn find_one(&self, _: &str, _: &Filter) -> Result<Option<Value>, StoreError> {
            std::future::pending().await
        }
        async fn insert_one(&self, _: &str, _: Value) -> Result<(), StoreError> {
            Ok(())
        }
        async fn insert_one_capped(&self, _: &str, _: Value, _: &Filter, _: u64) -> Result<bool, StoreError> {
            Ok(true)
        }
        async fn update_one(&self, _: &str, _: &Filter, _: Map<String, Value>) -> Result<Option<Value>, StoreError> {
            Ok(None)
        }
        async fn delete_one(&self, _: &str, _: &Filter) -> Result<bool, StoreError> {
            Ok(false)
        }
        async fn count(&self, _: &str, _: &Filter) -> Result<u64, StoreError> {
            Ok(0)
        }
        async fn ensure_indexes(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn with_primary(primary: impl DocumentStore + 'static) -> Datastore {
        Datastore::new(
            Some(Arc::new(primary)),
            Arc::new(MemoryStore::seeded()),
            Duration::from_millis(100),
        )
    }

    #[tokio::test]
    async fn test_reads_fall_back_when_ping_fails() {
        let store = with_primary(DownStore);
        assert_eq!(store.backend().await, Backend::Fallback);
        let cases = store
            .find(CASE_STUDIES, &Filter::new(), &FindOptions::new())
            .await
            .unwrap();
        assert!(!cases.is_empty());
    }

    #[tokio::test]
    async fn test_failed_primary_read_is_repeated_on_fallback() {
        let store = with_primary(FlakyStore);
        assert_eq!(store.backend().await, Backend::Primary);
        let cases = store
            .find(CASE_STUDIES, &Filter::new(), &FindOptions::new())
            .await
            .unwrap();
        assert!(!cases.is_empty());
    }

    #[tokio::test]
    async fn test_hung_primary_read_times_out_to_fallback() {
        let store = with_primary(FlakyStore);
        let found = store
            .find_one(CASE_STUDIES, &Filter::new())
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_write_policy() {
        let store = with_primary(DownStore);
        let err = store
            .insert_one("things", json!({"id": "1"}), WritePolicy::PrimaryOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.fallback().count("things", &Filter::new()).await.unwrap(), 0);

        store
            .insert_one("things", json!({"id": "1"}), WritePolicy::AllowFallback)
            .await
            .unwrap();
        assert_eq!(store.fallback().count("things", &Filter::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_only_mode_accepts_all_writes() {
        let store = Datastore::in_memory(MemoryStore::new());
        assert!(!store.has_primary());
        store
            .insert_one("things", json!({"id": "1"}), WritePolicy::PrimaryOnly)
            .await
            .unwrap();
        assert_eq!(store.count("things", &Filter::new()).await.unwrap(), 1);
    }
}
