//! Business logic services

pub mod admin;
pub mod auth;
pub mod blob;
pub mod cases;
pub mod email;
pub mod inquiries;
pub mod media;
pub mod posts;
pub mod rate_limit;

use std::sync::Arc;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub admin: admin::AdminService,
    pub posts: posts::PostsService,
    pub cases: cases::CasesService,
    pub inquiries: inquiries::InquiriesService,
    pub media: media::MediaService,
    pub repository: Repository,
}

impl Services {
    /// Wire every service around one repository and the outbound adapters
    pub fn new(
        repository: Repository,
        config: &AppConfig,
        mailer: Arc<dyn email::Mailer>,
        blobs: Arc<dyn blob::BlobStore>,
    ) -> AppResult<Self> {
        let limiter = rate_limit::RateLimiter::new();
        let media = media::MediaService::new(blobs);
        let email = email::EmailService::new(mailer, config.email.notify_to.clone());
        let cases = cases::CasesService::new(repository.clone(), media.clone());

        Ok(Self {
            admin: admin::AdminService::new(
                repository.clone(),
                auth::AdminAuth::new(&config.admin)?,
                cases.clone(),
                limiter.clone(),
                &config.rate_limit,
            ),
            posts: posts::PostsService::new(repository.clone(), media.clone()),
            inquiries: inquiries::InquiriesService::new(
                repository.clone(),
                email,
                limiter,
                &config.rate_limit,
            ),
            cases,
            media,
            repository,
        })
    }
}
