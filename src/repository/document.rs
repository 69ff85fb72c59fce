//! Collection-style document store interface shared by the primary and
//! fallback backends

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::time::Duration;
use thiserror::Error;

use crate::error::{AppError, AppResult};

pub const DAILY_POSTS: &str = "daily_posts";
pub const CASE_STUDIES: &str = "case_studies";
pub const CONTACT_INQUIRIES: &str = "contact_inquiries";

/// A field whose value must be unique within a collection
#[derive(Debug, Clone, Copy)]
pub struct UniqueKey {
    pub collection: &'static str,
    pub field: &'static str,
    /// Only documents with this boolean field set to `true` take part
    pub when: Option<&'static str>,
}

impl UniqueKey {
    pub fn applies_to(&self, doc: &Value) -> bool {
        match self.when {
            Some(flag) => doc.get(flag) == Some(&Value::Bool(true)),
            None => true,
        }
    }
}

pub const UNIQUE_KEYS: &[UniqueKey] = &[
    UniqueKey {
        collection: CASE_STUDIES,
        field: "slug",
        when: None,
    },
    UniqueKey {
        collection: DAILY_POSTS,
        field: "order",
        when: Some("isActive"),
    },
];

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("datastore unavailable: {0}")]
    Unavailable(String),

    #[error("datastore operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("duplicate value for unique key {0}")]
    Duplicate(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A single match condition on a top-level document field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value
    Eq(String, Value),
    /// Array field contains the value
    Contains(String, Value),
    /// String field contains the text, ignoring case
    ContainsText(String, String),
}

impl Condition {
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Condition::Eq(field, value) => doc.get(field) == Some(value),
            Condition::Contains(field, value) => doc
                .get(field)
                .and_then(Value::as_array)
                .map(|items| items.contains(value))
                .unwrap_or(false),
            Condition::ContainsText(field, text) => doc
                .get(field)
                .and_then(Value::as_str)
                .map(|s| s.to_lowercase().contains(&text.to_lowercase()))
                .unwrap_or(false),
        }
    }
}

/// Conjunction of conditions; the empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: &str) -> Self {
        Self::new().eq("id", id)
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.to_string(), value.into()));
        self
    }

    pub fn contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Contains(field.to_string(), value.into()));
        self
    }

    pub fn contains_text(mut self, field: &str, text: &str) -> Self {
        self.conditions
            .push(Condition::ContainsText(field.to_string(), text.to_string()));
        self
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Sort and pagination for `find`
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub sort: Vec<(String, SortOrder)>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_asc(mut self, field: &str) -> Self {
        self.sort.push((field.to_string(), SortOrder::Asc));
        self
    }

    pub fn sort_desc(mut self, field: &str) -> Self {
        self.sort.push((field.to_string(), SortOrder::Desc));
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Ordering of two documents under these sort keys
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for (field, order) in &self.sort {
            let ord = compare_values(a.get(field), b.get(field));
            let ord = match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Missing and null sort first, then booleans, numbers, strings
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Operations every backing store provides for a named collection.
///
/// Documents are JSON objects carrying a string `id` field.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Cheap health check
    async fn ping(&self) -> Result<(), StoreError>;

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when a unique key collides
    async fn insert_one(&self, collection: &str, doc: Value) -> Result<(), StoreError>;

    /// Insert only while fewer than `max` documents match `scope`, as one
    /// atomic step. Returns whether the document was inserted.
    async fn insert_one_capped(
        &self,
        collection: &str,
        doc: Value,
        scope: &Filter,
        max: u64,
    ) -> Result<bool, StoreError>;

    /// Shallow-merge `patch` into the first matching document and return it
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError>;

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<bool, StoreError>;

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Create collections, unique keys and secondary indexes
    async fn ensure_indexes(&self) -> Result<(), StoreError>;
}

/// Id of a document, required by every backend
pub fn document_id(doc: &Value) -> Result<&str, StoreError> {
    doc.get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidDocument("document has no string id".to_string()))
}

pub fn encode<T: Serialize>(entity: &T) -> AppResult<Value> {
    serde_json::to_value(entity).map_err(|e| AppError::Internal(format!("Failed to encode document: {}", e)))
}

pub fn decode<T: DeserializeOwned>(doc: Value) -> AppResult<T> {
    serde_json::from_value(doc).map_err(|e| AppError::Internal(format!("Failed to decode document: {}", e)))
}

pub fn decode_all<T: DeserializeOwned>(docs: Vec<Value>) -> AppResult<Vec<T>> {
    docs.into_iter().map(decode).collect()
}

/// Serialize a partial update into a field patch
pub fn to_patch<T: Serialize>(update: &T) -> AppResult<Map<String, Value>> {
    match encode(update)? {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::Internal("Update did not serialize to an object".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matching() {
        let doc = json!({
            "id": "1",
            "industry": "Business Consulting",
            "tags": ["UX", "SEO"],
            "isPublished": true
        });
        assert!(Filter::new().matches(&doc));
        assert!(Filter::new().eq("isPublished", true).matches(&doc));
        assert!(Filter::new().contains("tags", "SEO").matches(&doc));
        assert!(!Filter::new().contains("tags", "seo").matches(&doc));
        assert!(Filter::new().contains_text("industry", "consult").matches(&doc));
        assert!(!Filter::new()
            .eq("isPublished", true)
            .contains("tags", "Branding")
            .matches(&doc));
    }

    #[test]
    fn test_sort_compare() {
        let options = FindOptions::new().sort_asc("order").sort_desc("createdAt");
        let a = json!({"order": 1, "createdAt": "2024-01-01T00:00:00Z"});
        let b = json!({"order": 1, "createdAt": "2024-06-01T00:00:00Z"});
        let c = json!({"order": 0, "createdAt": "2023-01-01T00:00:00Z"});
        let mut docs = vec![a.clone(), b.clone(), c.clone()];
        docs.sort_by(|x, y| options.compare(x, y));
        assert_eq!(docs, vec![c, b, a]);
    }
}
