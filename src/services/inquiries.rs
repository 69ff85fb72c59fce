//! Contact inquiries service: public submission pipeline and admin triage

use chrono::{Duration, Utc};
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    config::RateLimitConfig,
    error::{AppError, AppResult},
    models::{
        inquiry::{
            ClientMetadata, ContactInquiry, ContactSubmission, InquiryPage, InquiryQuery, InquiryStatus,
            UpdateInquiry,
        },
        timestamp,
    },
    repository::{document::to_patch, Repository},
    services::{email::EmailService, rate_limit::RateLimiter},
    validation::check,
};

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 200;

#[derive(Clone)]
pub struct InquiriesService {
    repository: Repository,
    email: EmailService,
    limiter: RateLimiter,
    limit: u32,
    window: Duration,
}

impl InquiriesService {
    pub fn new(
        repository: Repository,
        email: EmailService,
        limiter: RateLimiter,
        config: &RateLimitConfig,
    ) -> Self {
        Self {
            repository,
            email,
            limiter,
            limit: config.contact_limit,
            window: Duration::seconds(config.contact_window_secs as i64),
        }
    }

    /// Sanitize, validate, rate-limit, persist, then notify. A failed
    /// notification does not fail the submission.
    pub async fn submit(
        &self,
        submission: ContactSubmission,
        client: ClientMetadata,
    ) -> AppResult<ContactInquiry> {
        let submission = submission.normalized();
        check(&submission)?;

        let decision = self.limiter.check(
            &format!("contact:{}", client.ip_address),
            self.limit,
            self.window,
        );
        if !decision.permitted {
            return Err(AppError::RateLimited {
                reset_at: decision.reset_at,
            });
        }

        let inquiry = submission.into_inquiry(Uuid::new_v4().to_string(), client, Utc::now());
        self.repository.inquiries.create(&inquiry).await?;
        tracing::info!(inquiry_id = %inquiry.id, remaining = decision.remaining, "Stored contact inquiry");

        if let Err(e) = self.email.notify_new_inquiry(&inquiry).await {
            tracing::warn!(inquiry_id = %inquiry.id, error = %e, "Inquiry notification failed");
        }
        Ok(inquiry)
    }

    pub async fn list(&self, query: &InquiryQuery) -> AppResult<InquiryPage> {
        let status = match query.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(status) => Some(
                InquiryStatus::from_str(status)
                    .map_err(|_| {
                        AppError::invalid(
                            "status",
                            "Status must be one of: all, new, contacted, converted, closed",
                        )
                    })?
                    .as_str(),
            ),
        };
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let skip = query.skip.unwrap_or(0);

        let (inquiries, total) = self.repository.inquiries.list(status, limit, skip).await?;
        let has_more = skip + (inquiries.len() as u64) < total;
        Ok(InquiryPage {
            inquiries,
            total,
            has_more,
        })
    }

    /// Partial update; moving to `contacted` also stamps `contactedAt`
    pub async fn update(&self, id: &str, payload: UpdateInquiry) -> AppResult<ContactInquiry> {
        let payload = payload.sanitized();
        check(&payload)?;

        let now = Utc::now();
        let mut patch = to_patch(&payload)?;
        if payload.moves_to_contacted() {
            patch.insert("contactedAt".to_string(), timestamp::to_value(now));
        }
        self.repository.inquiries.update(id, patch, now).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.repository.inquiries.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{Datastore, MemoryStore};
    use crate::services::email::MockMailer;
    use std::sync::Arc;

    fn service(mailer: MockMailer) -> InquiriesService {
        let repository = Repository::new(Datastore::in_memory(MemoryStore::new()));
        let email = EmailService::new(Arc::new(mailer), Some("owner@example.com".into()));
        InquiriesService::new(repository, email, RateLimiter::new(), &RateLimitConfig::default())
    }

    fn quiet() -> MockMailer {
        let mut mailer = MockMailer::new();
        mailer.expect_send().returning(|_| Ok(()));
        mailer
    }

    fn submission() -> ContactSubmission {
        ContactSubmission {
            name: "Jane Doe".into(),
            email: "Jane@Example.com".into(),
            phone: "+1 555 123 4567".into(),
            service: Some("Branding".into()),
            message: Some("Hello there".into()),
        }
    }

    fn client(ip: &str) -> ClientMetadata {
        ClientMetadata {
            ip_address: ip.into(),
            user_agent: "test".into(),
            referrer: "direct".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fourth_submission_is_rate_limited() {
        let service = service(quiet());
        for _ in 0..3 {
            service.submit(submission(), client("1.2.3.4")).await.unwrap();
        }
        let err = service.submit(submission(), client("1.2.3.4")).await.unwrap_err();
        assert!(matches!(err, AppError::RateLimited { .. }));

        service.submit(submission(), client("5.6.7.8")).await.unwrap();
        assert_eq!(service.list(&InquiryQuery::default()).await.unwrap().total, 4);
    }

    #[tokio::test]
    async fn test_invalid_submission_does_not_consume_quota() {
        let service = service(quiet());
        let mut bad = submission();
        bad.email = "nope".into();
        for _ in 0..5 {
            assert!(matches!(
                service.submit(bad.clone(), client("1.2.3.4")).await,
                Err(AppError::Validation(_))
            ));
        }
        service.submit(submission(), client("1.2.3.4")).await.unwrap();
    }

    #[tokio::test]
    async fn test_email_failure_keeps_inquiry() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_| Err(AppError::Upstream("smtp down".into())));
        let service = service(mailer);

        let inquiry = service.submit(submission(), client("1.2.3.4")).await.unwrap();
        assert_eq!(inquiry.email, "jane@example.com");
        assert_eq!(inquiry.status, InquiryStatus::New);
        let page = service.list(&InquiryQuery::default()).await.unwrap();
        assert_eq!(page.inquiries[0].id, inquiry.id);
    }

    #[tokio::test]
    async fn test_contacted_stamps_contacted_at() {
        let service = service(quiet());
        let inquiry = service.submit(submission(), client("1.2.3.4")).await.unwrap();

        let notes = UpdateInquiry {
            status: None,
            notes: Some("Left a voicemail".into()),
        };
        let updated = service.update(&inquiry.id, notes).await.unwrap();
        assert!(updated.contacted_at.is_none());

        let contacted = UpdateInquiry {
            status: Some("contacted".into()),
            notes: None,
        };
        let updated = service.update(&inquiry.id, contacted).await.unwrap();
        assert_eq!(updated.status, InquiryStatus::Contacted);
        assert!(updated.contacted_at.is_some());
        assert_eq!(updated.notes.as_deref(), Some("Left a voicemail"));
        assert!(updated.updated_at >= inquiry.updated_at);
    }

    #[tokio::test]
    async fn test_list_paging_and_status_filter() {
        let service = service(quiet());
        for i in 0..3 {
            service
                .submit(submission(), client(&format!("10.0.0.{}", i)))
                .await
                .unwrap();
        }

        let page = service
            .list(&InquiryQuery {
                status: Some("all".into()),
                limit: Some(2),
                skip: None,
            })
            .await
            .unwrap();
        assert_eq!(page.inquiries.len(), 2);
        assert!(page.has_more);

        let page = service
            .list(&InquiryQuery {
                status: Some("new".into()),
                limit: Some(2),
                skip: Some(2),
            })
            .await
            .unwrap();
        assert_eq!(page.inquiries.len(), 1);
        assert!(!page.has_more);

        let err = service
            .list(&InquiryQuery {
                status: Some("archived".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
