//! In-memory fallback store
//!
//! Linear scans over per-collection vectors. Nothing survives a restart.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::document::{document_id, DocumentStore, Filter, FindOptions, StoreError, UNIQUE_KEYS};

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the sample content from [`super::seed`]
    pub fn seeded() -> Self {
        let store = Self::new();
        {
            let mut collections = store.lock();
            for (collection, docs) in super::seed::sample_documents() {
                collections.entry(collection.to_string()).or_default().extend(docs);
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Value>>> {
        self.collections.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Reject `candidate` if it shares a unique key with any other document
fn check_unique(collection: &str, docs: &[Value], candidate: &Value, skip_id: Option<&str>) -> Result<(), StoreError> {
    for key in UNIQUE_KEYS {
        if key.collection != collection || !key.applies_to(candidate) {
            continue;
        }
        let Some(value) = candidate.get(key.field) else {
            continue;
        };
        let clash = docs.iter().any(|doc| {
            key.applies_to(doc)
                && doc.get(key.field) == Some(value)
                && doc.get("id").and_then(Value::as_str) != skip_id
        });
        if clash {
            return Err(StoreError::Duplicate(format!("{}.{}", collection, key.field)));
        }
    }
    Ok(())
}

fn insert_checked(collection: &str, docs: &mut Vec<Value>, doc: Value) -> Result<(), StoreError> {
    let id = document_id(&doc)?;
    if docs.iter().any(|d| d.get("id").and_then(Value::as_str) == Some(id)) {
        return Err(StoreError::Duplicate(format!("{}.id", collection)));
    }
    check_unique(collection, docs, &doc, None)?;
    docs.push(doc);
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError> {
        let collections = self.lock();
        let mut docs: Vec<Value> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();
        if !options.sort.is_empty() {
            docs.sort_by(|a, b| options.compare(a, b));
        }
        let skip = options.skip.unwrap_or(0) as usize;
        let limit = options.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(docs.into_iter().skip(skip).take(limit).collect())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>, StoreError> {
        let collections = self.lock();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)).cloned()))
    }

    async fn insert_one(&self, collection: &str, doc: Value) -> Result<(), StoreError> {
        let mut collections = self.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        insert_checked(collection, docs, doc)
    }

    async fn insert_one_capped(
        &self,
        collection: &str,
        doc: Value,
        scope: &Filter,
        max: u64,
    ) -> Result<bool, StoreError> {
        let mut collections = self.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        let current = docs.iter().filter(|d| scope.matches(d)).count() as u64;
        if current >= max {
            return Ok(false);
        }
        insert_checked(collection, docs, doc)?;
        Ok(true)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        let mut collections = self.lock();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(index) = docs.iter().position(|d| filter.matches(d)) else {
            return Ok(None);
        };

        let mut updated = docs[index].clone();
        if let Value::Object(fields) = &mut updated {
            for (key, value) in patch {
                if key != "id" {
                    fields.insert(key, value);
                }
            }
        }
        let id = document_id(&updated)?.to_string();
        check_unique(collection, docs, &updated, Some(&id))?;
        docs[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<bool, StoreError> {
        let mut collections = self.lock();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self.lock();
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count() as u64)
            .unwrap_or(0))
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::document::{CASE_STUDIES, DAILY_POSTS};
    use serde_json::json;

    #[tokio::test]
    async fn test_crud_round() {
        let store = MemoryStore::new();
        store
            .insert_one("things", json!({"id": "a", "n": 2}))
            .await
            .unwrap();
        store
            .insert_one("things", json!({"id": "b", "n": 1}))
            .await
            .unwrap();

        let sorted = store
            .find("things", &Filter::new(), &FindOptions::new().sort_asc("n"))
            .await
            .unwrap();
        assert_eq!(sorted[0]["id"], "b");

        let mut patch = Map::new();
        patch.insert("n".into(), json!(5));
        let updated = store
            .update_one("things", &Filter::by_id("b"), patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["n"], 5);

        assert!(store.delete_one("things", &Filter::by_id("a")).await.unwrap());
        assert!(!store.delete_one("things", &Filter::by_id("a")).await.unwrap());
        assert_eq!(store.count("things", &Filter::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unique_slug_is_enforced() {
        let store = MemoryStore::new();
        store
            .insert_one(CASE_STUDIES, json!({"id": "1", "slug": "same"}))
            .await
            .unwrap();
        let err = store
            .insert_one(CASE_STUDIES, json!({"id": "2", "slug": "same"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.count(CASE_STUDIES, &Filter::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_active_post_order_is_unique() {
        let store = MemoryStore::new();
        store
            .insert_one(DAILY_POSTS, json!({"id": "a", "order": 1, "isActive": true}))
            .await
            .unwrap();
        let err = store
            .insert_one(DAILY_POSTS, json!({"id": "b", "order": 1, "isActive": true}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        // Inactive posts may share a slot
        store
            .insert_one(DAILY_POSTS, json!({"id": "c", "order": 1, "isActive": false}))
            .await
            .unwrap();

        let mut patch = Map::new();
        patch.insert("isActive".into(), json!(true));
        let err = store
            .update_one(DAILY_POSTS, &Filter::by_id("c"), patch)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_capped_insert() {
        let store = MemoryStore::new();
        let scope = Filter::new().eq("active", true);
        for i in 0..2 {
            let inserted = store
                .insert_one_capped("posts", json!({"id": i.to_string(), "active": true}), &scope, 2)
                .await
                .unwrap();
            assert!(inserted);
        }
        let inserted = store
            .insert_one_capped("posts", json!({"id": "x", "active": true}), &scope, 2)
            .await
            .unwrap();
        assert!(!inserted);
    }

    #[tokio::test]
    async fn test_pagination() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .insert_one("things", json!({"id": i.to_string(), "n": i}))
                .await
                .unwrap();
        }
        let page = store
            .find(
                "things",
                &Filter::new(),
                &FindOptions::new().sort_desc("n").skip(1).limit(2),
            )
            .await
            .unwrap();
        let ns: Vec<_> = page.iter().map(|d| d["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![3, 2]);
    }
}
