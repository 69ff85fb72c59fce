//! Admin session checks and datastore maintenance

use chrono::Duration;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    config::RateLimitConfig,
    error::{AppError, AppResult},
    repository::{Backend, Repository},
    services::{auth::AdminAuth, cases::CasesService, rate_limit::RateLimiter},
    validation::{check, ADMIN_PIN},
};

/// Admin PIN submitted by the login form
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct PinRequest {
    #[serde(default)]
    #[validate(regex(path = *ADMIN_PIN, message = "PIN must be exactly 4 digits"))]
    pub pin: String,
}

/// Outcome of `init-db`
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitReport {
    pub backend: Backend,
    pub indexes_ensured: bool,
    pub seeded_cases: usize,
}

#[derive(Clone)]
pub struct AdminService {
    repository: Repository,
    auth: AdminAuth,
    cases: CasesService,
    limiter: RateLimiter,
    pin_limit: u32,
    pin_window: Duration,
}

impl AdminService {
    pub fn new(
        repository: Repository,
        auth: AdminAuth,
        cases: CasesService,
        limiter: RateLimiter,
        config: &RateLimitConfig,
    ) -> Self {
        Self {
            repository,
            auth,
            cases,
            limiter,
            pin_limit: config.pin_limit,
            pin_window: Duration::seconds(config.pin_window_secs as i64),
        }
    }

    /// Gate for every mutating endpoint
    pub fn authorize(&self, pin: Option<&str>) -> AppResult<()> {
        self.auth.authorize(pin)
    }

    /// Login check: format, then attempt budget, then the PIN itself
    pub fn verify_pin(&self, request: &PinRequest, client: &str) -> AppResult<()> {
        check(request)?;
        let decision = self.limiter.check(
            &format!("admin-pin:{}", client),
            self.pin_limit,
            self.pin_window,
        );
        if !decision.permitted {
            return Err(AppError::RateLimited {
                reset_at: decision.reset_at,
            });
        }
        self.auth.authorize(Some(&request.pin))
    }

    /// Ensure the primary's schema and seed sample case studies if empty
    pub async fn init_db(&self) -> AppResult<InitReport> {
        self.repository.store.ensure_primary_indexes().await?;
        let seeded_cases = self.cases.seed_samples().await?;
        Ok(InitReport {
            backend: self.repository.store.backend().await,
            indexes_ensured: true,
            seeded_cases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminConfig;
    use crate::repository::{Datastore, MemoryStore};
    use crate::services::{blob::MockBlobStore, media::MediaService};
    use std::sync::Arc;

    fn service() -> AdminService {
        let repository = Repository::new(Datastore::in_memory(MemoryStore::new()));
        let auth = AdminAuth::new(&AdminConfig {
            pin_hash: None,
            dev_pin: Some("2468".into()),
        })
        .unwrap();
        let cases = CasesService::new(
            repository.clone(),
            MediaService::new(Arc::new(MockBlobStore::new())),
        );
        AdminService::new(
            repository,
            auth,
            cases,
            RateLimiter::new(),
            &RateLimitConfig::default(),
        )
    }

    fn pin(value: &str) -> PinRequest {
        PinRequest { pin: value.into() }
    }

    #[test]
    fn test_pin_format_is_checked_first() {
        let service = service();
        assert!(matches!(
            service.verify_pin(&pin("24a8"), "ip"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.verify_pin(&pin("12345"), "ip"),
            Err(AppError::Validation(_))
        ));
        assert!(service.verify_pin(&pin("2468"), "ip").is_ok());
    }

    #[test]
    fn test_pin_attempts_are_limited() {
        let service = service();
        for _ in 0..5 {
            assert!(matches!(
                service.verify_pin(&pin("1111"), "ip"),
                Err(AppError::Authorization(_))
            ));
        }
        assert!(matches!(
            service.verify_pin(&pin("2468"), "ip"),
            Err(AppError::RateLimited { .. })
        ));
        assert!(service.verify_pin(&pin("2468"), "other-ip").is_ok());
    }

    #[tokio::test]
    async fn test_init_db_needs_a_primary() {
        let err = service().init_db().await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
