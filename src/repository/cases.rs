//! Case studies repository

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::document::{decode, decode_all, encode, Filter, FindOptions, StoreError, CASE_STUDIES};
use super::router::{Datastore, WritePolicy};
use crate::{
    error::{AppError, AppResult},
    models::{
        case_study::{CaseQuery, CaseStudy},
        timestamp,
    },
};

const WRITES: WritePolicy = WritePolicy::PrimaryOnly;

/// `All` (any case) or an empty value disables a list filter
fn filter_value(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

fn by_slug(slug: &str) -> Filter {
    Filter::new().eq("slug", slug)
}

fn not_found(slug: &str) -> AppError {
    AppError::NotFound(format!("Case study {} not found", slug))
}

#[derive(Clone)]
pub struct CasesRepository {
    store: Datastore,
}

impl CasesRepository {
    pub fn new(store: Datastore) -> Self {
        Self { store }
    }

    /// Published case studies, `order` ascending then newest first
    pub async fn list_published(&self, query: &CaseQuery) -> AppResult<Vec<CaseStudy>> {
        let mut filter = Filter::new().eq("isPublished", true);
        if let Some(industry) = filter_value(query.industry.as_deref()) {
            filter = filter.contains_text("industry", industry);
        }
        if let Some(tag) = filter_value(query.tags.as_deref()) {
            filter = filter.contains("tags", tag);
        }
        let options = FindOptions::new().sort_asc("order").sort_desc("createdAt");
        let docs = self.store.find(CASE_STUDIES, &filter, &options).await?;
        decode_all(docs)
    }

    pub async fn get_published(&self, slug: &str) -> AppResult<CaseStudy> {
        let filter = by_slug(slug).eq("isPublished", true);
        self.store
            .find_one(CASE_STUDIES, &filter)
            .await?
            .map(decode)
            .transpose()?
            .ok_or_else(|| not_found(slug))
    }

    /// Lookup in the store that would take a write, published or not
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<CaseStudy>> {
        self.store
            .find_one_for_write(CASE_STUDIES, &by_slug(slug), WRITES)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn count(&self) -> AppResult<u64> {
        Ok(self.store.count_for_write(CASE_STUDIES, &Filter::new(), WRITES).await?)
    }

    pub async fn create(&self, case: &CaseStudy) -> AppResult<()> {
        match self.store.insert_one(CASE_STUDIES, encode(case)?, WRITES).await {
            Ok(()) => Ok(()),
            Err(StoreError::Duplicate(_)) => Err(AppError::Conflict(format!(
                "A case study with slug '{}' already exists",
                case.slug
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update(
        &self,
        slug: &str,
        mut patch: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> AppResult<CaseStudy> {
        patch.remove("slug");
        patch.insert("updatedAt".to_string(), timestamp::to_value(now));
        self.store
            .update_one(CASE_STUDIES, &by_slug(slug), patch, WRITES)
            .await?
            .map(decode)
            .transpose()?
            .ok_or_else(|| not_found(slug))
    }

    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        if !self.store.delete_one(CASE_STUDIES, &by_slug(slug), WRITES).await? {
            return Err(not_found(slug));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{memory::MemoryStore, seed::sample_case_studies};

    fn seeded() -> CasesRepository {
        CasesRepository::new(Datastore::in_memory(MemoryStore::seeded()))
    }

    #[test]
    fn test_all_disables_filter() {
        assert_eq!(filter_value(Some("All")), None);
        assert_eq!(filter_value(Some(" ")), None);
        assert_eq!(filter_value(Some("UX")), Some("UX"));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let repo = seeded();
        let all = repo.list_published(&CaseQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].order <= w[1].order));

        let query = CaseQuery {
            industry: Some("architect".into()),
            tags: Some("UX".into()),
        };
        let found = repo.list_published(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].industry, "Architecture");

        let query = CaseQuery {
            industry: Some("All".into()),
            tags: Some("ux".into()),
        };
        assert!(repo.list_published(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_colliding_slug_is_a_conflict() {
        let repo = seeded();
        let mut copy = sample_case_studies(Utc::now()).remove(0);
        copy.id = "another".into();
        let err = repo.create(&copy).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_unpublished_case_is_hidden() {
        let repo = seeded();
        let slug = sample_case_studies(Utc::now())[0].slug.clone();
        let mut patch = Map::new();
        patch.insert("isPublished".into(), Value::Bool(false));
        let updated = repo.update(&slug, patch, Utc::now()).await.unwrap();
        assert!(!updated.is_published);
        assert!(matches!(
            repo.get_published(&slug).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(repo.find_by_slug(&slug).await.unwrap().is_some());
    }
}
