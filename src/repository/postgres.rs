//! Primary store: JSONB documents in PostgreSQL

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{
    postgres::PgPoolOptions,
    types::Json,
    Pool, Postgres, QueryBuilder,
};
use std::time::Duration;

use super::document::{document_id, Condition, DocumentStore, Filter, FindOptions, SortOrder, StoreError};
use crate::config::DatabaseConfig;

/// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: Pool<Postgres>,
}

impl PgDocumentStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Build a pool without connecting; reachability is decided by `ping`
    pub fn connect_lazy(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_millis(config.timeout_ms))
            .connect_lazy(url)?;
        Ok(Self::new(pool))
    }
}

/// Escape LIKE metacharacters
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_where<'a>(qb: &mut QueryBuilder<'a, Postgres>, collection: &str, filter: &Filter) {
    qb.push(" WHERE collection = ");
    qb.push_bind(collection.to_string());
    for condition in &filter.conditions {
        match condition {
            Condition::Eq(field, value) => {
                qb.push(" AND (doc -> ");
                qb.push_bind(field.clone());
                qb.push("::text) = ");
                qb.push_bind(Json(value.clone()));
                qb.push("::jsonb");
            }
            Condition::Contains(field, value) => {
                qb.push(" AND (doc -> ");
                qb.push_bind(field.clone());
                qb.push("::text) @> ");
                qb.push_bind(Json(Value::Array(vec![value.clone()])));
                qb.push("::jsonb");
            }
            Condition::ContainsText(field, text) => {
                qb.push(" AND (doc ->> ");
                qb.push_bind(field.clone());
                qb.push("::text) ILIKE ");
                qb.push_bind(like_pattern(text));
            }
        }
    }
}

/// Select the (collection, id) key of the first matching row
fn push_first_match<'a>(qb: &mut QueryBuilder<'a, Postgres>, collection: &str, filter: &Filter) {
    qb.push(" WHERE (collection, id) IN (SELECT collection, id FROM documents");
    push_where(qb, collection, filter);
    qb.push(" LIMIT 1)");
}

fn map_write_error(collection: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Duplicate(format!("{} ({})", collection, db.message()));
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT doc FROM documents");
        push_where(&mut qb, collection, filter);

        if !options.sort.is_empty() {
            qb.push(" ORDER BY ");
            for (i, (field, order)) in options.sort.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                qb.push("(doc -> ");
                qb.push_bind(field.clone());
                qb.push("::text)");
                qb.push(match order {
                    SortOrder::Asc => " ASC",
                    SortOrder::Desc => " DESC",
                });
            }
        }
        if let Some(limit) = options.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit as i64);
        }
        if let Some(skip) = options.skip {
            qb.push(" OFFSET ");
            qb.push_bind(skip as i64);
        }

        let rows: Vec<(Json<Value>,)> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(Json(doc),)| doc).collect())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT doc FROM documents");
        push_where(&mut qb, collection, filter);
        qb.push(" LIMIT 1");

        let row: Option<(Json<Value>,)> = qb.build_query_as().fetch_optional(&self.pool).await?;
        Ok(row.map(|(Json(doc),)| doc))
    }

    async fn insert_one(&self, collection: &str, doc: Value) -> Result<(), StoreError> {
        let id = document_id(&doc)?.to_string();
        sqlx::query("INSERT INTO documents (collection, id, doc) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id)
            .bind(Json(doc))
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(collection, e))?;
        Ok(())
    }

    async fn insert_one_capped(
        &self,
        collection: &str,
        doc: Value,
        scope: &Filter,
        max: u64,
    ) -> Result<bool, StoreError> {
        let id = document_id(&doc)?.to_string();
        let mut tx = self.pool.begin().await?;

        // Serializes capped inserts per collection until commit
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(collection)
            .execute(&mut *tx)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents");
        push_where(&mut qb, collection, scope);
        let current: i64 = qb.build_query_scalar().fetch_one(&mut *tx).await?;
        if current as u64 >= max {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("INSERT INTO documents (collection, id, doc) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id)
            .bind(Json(doc))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(collection, e))?;
        tx.commit().await?;
        Ok(true)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        mut patch: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        patch.remove("id");
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE documents SET doc = doc || ");
        qb.push_bind(Json(Value::Object(patch)));
        qb.push("::jsonb");
        push_first_match(&mut qb, collection, filter);
        qb.push(" RETURNING doc");

        let row: Option<(Json<Value>,)> = qb
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(collection, e))?;
        Ok(row.map(|(Json(doc),)| doc))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<bool, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM documents");
        push_first_match(&mut qb, collection, filter);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents");
        push_where(&mut qb, collection, filter);

        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total.max(0) as u64)
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("Consulting"), "%Consulting%");
    }

    #[test]
    fn test_where_clause_binds_every_value() {
        let filter = Filter::new()
            .eq("isPublished", true)
            .contains("tags", "UX")
            .contains_text("industry", "arch");
        let mut qb = QueryBuilder::<Postgres>::new("SELECT doc FROM documents");
        push_where(&mut qb, "case_studies", &filter);
        let sql = qb.sql();
        assert!(sql.contains("collection = $1"));
        assert!(sql.contains("(doc -> $2::text) = $3::jsonb"));
        assert!(sql.contains("(doc -> $4::text) @> $5::jsonb"));
        assert!(sql.contains("(doc ->> $6::text) ILIKE $7"));
    }
}
