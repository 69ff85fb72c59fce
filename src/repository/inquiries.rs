//! Contact inquiries repository

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::document::{decode, decode_all, encode, Filter, FindOptions, CONTACT_INQUIRIES};
use super::router::{Datastore, WritePolicy};
use crate::{
    error::{AppError, AppResult},
    models::{inquiry::ContactInquiry, timestamp},
};

/// Leads are kept in the fallback store rather than refused
const WRITES: WritePolicy = WritePolicy::AllowFallback;

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Inquiry with id {} not found", id))
}

#[derive(Clone)]
pub struct InquiriesRepository {
    store: Datastore,
}

impl InquiriesRepository {
    pub fn new(store: Datastore) -> Self {
        Self { store }
    }

    /// Newest first, with the total matching count
    pub async fn list(
        &self,
        status: Option<&str>,
        limit: u64,
        skip: u64,
    ) -> AppResult<(Vec<ContactInquiry>, u64)> {
        let filter = match status {
            Some(status) => Filter::new().eq("status", status),
            None => Filter::new(),
        };
        let options = FindOptions::new().sort_desc("createdAt").skip(skip).limit(limit);
        let docs = self.store.find(CONTACT_INQUIRIES, &filter, &options).await?;
        let total = self.store.count(CONTACT_INQUIRIES, &filter).await?;
        Ok((decode_all(docs)?, total))
    }

    pub async fn create(&self, inquiry: &ContactInquiry) -> AppResult<()> {
        self.store
            .insert_one(CONTACT_INQUIRIES, encode(inquiry)?, WRITES)
            .await?;
        Ok(())
    }

    pub async fn update(
        &self,
        id: &str,
        mut patch: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> AppResult<ContactInquiry> {
        patch.insert("updatedAt".to_string(), timestamp::to_value(now));
        self.store
            .update_one(CONTACT_INQUIRIES, &Filter::by_id(id), patch, WRITES)
            .await?
            .map(decode)
            .transpose()?
            .ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if !self
            .store
            .delete_one(CONTACT_INQUIRIES, &Filter::by_id(id), WRITES)
            .await?
        {
            return Err(not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inquiry::{ClientMetadata, ContactSubmission, InquiryStatus};
    use crate::repository::memory::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn inquiry(id: &str, created_at: DateTime<Utc>) -> ContactInquiry {
        ContactSubmission {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            phone: "+15551234567".into(),
            ..Default::default()
        }
        .into_inquiry(id.to_string(), ClientMetadata::default(), created_at)
    }

    #[tokio::test]
    async fn test_list_newest_first_with_total() {
        let repo = InquiriesRepository::new(Datastore::in_memory(MemoryStore::new()));
        let now = Utc::now();
        for i in 0..3 {
            repo.create(&inquiry(&i.to_string(), now + Duration::minutes(i)))
                .await
                .unwrap();
        }

        let (page, total) = repo.list(None, 2, 0).await.unwrap();
        assert_eq!(total, 3);
        let ids: Vec<_> = page.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);

        let (page, total) = repo.list(Some("contacted"), 50, 0).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_sub_millisecond_order_is_kept() {
        let repo = InquiriesRepository::new(Datastore::in_memory(MemoryStore::new()));
        let whole = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        repo.create(&inquiry("older", whole)).await.unwrap();
        repo.create(&inquiry("newer", whole + Duration::microseconds(1)))
            .await
            .unwrap();

        let (page, _) = repo.list(None, 50, 0).await.unwrap();
        let ids: Vec<_> = page.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_update_status() {
        let repo = InquiriesRepository::new(Datastore::in_memory(MemoryStore::new()));
        repo.create(&inquiry("1", Utc::now())).await.unwrap();
        let mut patch = Map::new();
        patch.insert("status".into(), Value::String("closed".into()));
        let updated = repo.update("1", patch, Utc::now()).await.unwrap();
        assert_eq!(updated.status, InquiryStatus::Closed);

        repo.delete("1").await.unwrap();
        assert!(matches!(repo.delete("1").await.unwrap_err(), AppError::NotFound(_)));
    }
}
