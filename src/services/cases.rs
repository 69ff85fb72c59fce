//! Case studies service

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, FieldViolation},
    models::case_study::{CaseQuery, CaseStudy, CreateCaseStudy, UpdateCaseStudy},
    repository::{document::to_patch, seed::sample_case_studies, Repository},
    services::media::MediaService,
    validation::{check, check_with},
};

#[derive(Clone)]
pub struct CasesService {
    repository: Repository,
    media: MediaService,
}

impl CasesService {
    pub fn new(repository: Repository, media: MediaService) -> Self {
        Self { repository, media }
    }

    pub async fn list(&self, query: &CaseQuery) -> AppResult<Vec<CaseStudy>> {
        self.repository.cases.list_published(query).await
    }

    pub async fn get(&self, slug: &str) -> AppResult<CaseStudy> {
        self.repository.cases.get_published(slug).await
    }

    pub async fn create(&self, payload: CreateCaseStudy) -> AppResult<CaseStudy> {
        let payload = payload.sanitized();
        let slug = payload.slug();
        let mut extra = Vec::new();
        if slug.is_empty() && !payload.title.is_empty() {
            extra.push(FieldViolation::new(
                "title",
                "Title must contain at least one letter or digit",
            ));
        }
        check_with(&payload, extra)?;

        if self.repository.cases.find_by_slug(&slug).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "A case study with slug '{}' already exists",
                slug
            )));
        }

        let case = payload.into_case_study(Uuid::new_v4().to_string(), Utc::now());
        // The store's unique key catches a concurrent create with the same slug
        self.repository.cases.create(&case).await?;
        tracing::info!(slug = %case.slug, "Created case study");
        Ok(case)
    }

    pub async fn update(&self, slug: &str, payload: UpdateCaseStudy) -> AppResult<CaseStudy> {
        let payload = payload.sanitized();
        check(&payload)?;
        self.repository
            .cases
            .update(slug, to_patch(&payload)?, Utc::now())
            .await
    }

    /// Delete a case study and, best effort, its stored images
    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        let case = self
            .repository
            .cases
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Case study {} not found", slug)))?;
        self.media.cleanup(case.media_urls()).await;
        self.repository.cases.delete(slug).await
    }

    /// Insert the sample case studies when the collection is empty.
    /// Returns how many were inserted.
    pub async fn seed_samples(&self) -> AppResult<usize> {
        if self.repository.cases.count().await? > 0 {
            return Ok(0);
        }
        let samples = sample_case_studies(Utc::now());
        for case in &samples {
            self.repository.cases.create(case).await?;
        }
        tracing::info!(count = samples.len(), "Inserted sample case studies");
        Ok(samples.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{Datastore, MemoryStore};
    use crate::services::blob::MockBlobStore;
    use std::sync::Arc;

    fn service(store: MemoryStore, blobs: MockBlobStore) -> CasesService {
        let repository = Repository::new(Datastore::in_memory(store));
        CasesService::new(repository, MediaService::new(Arc::new(blobs)))
    }

    fn payload(title: &str) -> CreateCaseStudy {
        CreateCaseStudy {
            title: title.into(),
            description: "A portfolio rebuild for a boutique studio.".into(),
            tags: vec!["Branding".into()],
            industry: "Design".into(),
            project_type: "Website".into(),
            company_type: "Studio".into(),
            services: vec!["Web Design".into()],
            thumbnail_url: "/assets/case-new.jpg".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_slug_collision_leaves_original_untouched() {
        let service = service(MemoryStore::new(), MockBlobStore::new());
        let original = service.create(payload("Studio Refresh")).await.unwrap();

        let mut clash = payload("studio   refresh!");
        clash.description = "A different description entirely here.".into();
        let err = service.create(clash).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let stored = service.get(&original.slug).await.unwrap();
        assert_eq!(stored.id, original.id);
        assert_eq!(stored.description, original.description);
    }

    #[tokio::test]
    async fn test_unsluggable_title_is_invalid() {
        let service = service(MemoryStore::new(), MockBlobStore::new());
        match service.create(payload("!!!!!")).await {
            Err(AppError::Validation(violations)) => {
                assert!(violations.iter().any(|v| v.field == "title"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_keeps_slug() {
        let service = service(MemoryStore::new(), MockBlobStore::new());
        let case = service.create(payload("Studio Refresh")).await.unwrap();
        let update = UpdateCaseStudy {
            title: Some("Completely new title".into()),
            ..Default::default()
        };
        let updated = service.update(&case.slug, update).await.unwrap();
        assert_eq!(updated.slug, "studio-refresh");
        assert_eq!(updated.title, "Completely new title");
    }

    #[tokio::test]
    async fn test_delete_cleans_up_images() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_is_managed()
            .returning(|url| url.contains("blob.vercel-storage.com"));
        blobs.expect_delete().times(1).returning(|_| Ok(()));
        let service = service(MemoryStore::new(), blobs);

        let mut create = payload("Studio Refresh");
        create.detail_images = vec![
            "https://a.public.blob.vercel-storage.com/one.jpg".into(),
            "/assets/two.jpg".into(),
        ];
        let case = service.create(create).await.unwrap();
        service.delete(&case.slug).await.unwrap();
        assert!(matches!(
            service.get(&case.slug).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_seed_samples_only_when_empty() {
        let service = service(MemoryStore::new(), MockBlobStore::new());
        assert_eq!(service.seed_samples().await.unwrap(), 3);
        assert_eq!(service.seed_samples().await.unwrap(), 0);
        assert_eq!(service.list(&CaseQuery::default()).await.unwrap().len(), 3);
    }
}
