//! Admin PIN verification

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::AdminConfig,
    error::{AppError, AppResult},
};

/// Header carrying the admin PIN
pub const ADMIN_PIN_HEADER: &str = "x-admin-pin";

#[derive(Clone)]
pub struct AdminAuth {
    pin_hash: Option<String>,
    dev_pin: Option<String>,
}

impl AdminAuth {
    /// Fails when the configured hash is not a valid PHC string
    pub fn new(config: &AdminConfig) -> AppResult<Self> {
        if let Some(hash) = &config.pin_hash {
            PasswordHash::new(hash)
                .map_err(|e| AppError::Internal(format!("Invalid admin PIN hash: {}", e)))?;
        }
        if config.pin_hash.is_none() && config.dev_pin.is_none() {
            tracing::warn!("No admin PIN configured, every admin request will be rejected");
        }
        Ok(Self {
            pin_hash: config.pin_hash.clone(),
            dev_pin: config.dev_pin.clone().filter(|p| !p.is_empty()),
        })
    }

    /// Check a submitted PIN
    pub fn authorize(&self, pin: Option<&str>) -> AppResult<()> {
        let pin = pin
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::Authorization("Admin PIN required".to_string()))?;

        if self.dev_pin.as_deref() == Some(pin) {
            tracing::debug!("Admin authorized with development PIN");
            return Ok(());
        }

        if let Some(hash) = &self.pin_hash {
            let parsed = PasswordHash::new(hash)
                .map_err(|_| AppError::Internal("Invalid admin PIN hash".to_string()))?;
            if Argon2::default().verify_password(pin.as_bytes(), &parsed).is_ok() {
                return Ok(());
            }
        }

        Err(AppError::Authorization("Invalid admin PIN".to_string()))
    }
}

/// Hash a PIN using Argon2
pub fn hash_pin(pin: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash PIN: {}", e)))?;
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashed(pin: &str) -> AdminAuth {
        AdminAuth::new(&AdminConfig {
            pin_hash: Some(hash_pin(pin).unwrap()),
            dev_pin: None,
        })
        .unwrap()
    }

    #[test]
    fn test_missing_pin() {
        let auth = hashed("4821");
        match auth.authorize(None) {
            Err(AppError::Authorization(msg)) => assert_eq!(msg, "Admin PIN required"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(auth.authorize(Some("  ")).is_err());
    }

    #[test]
    fn test_hashed_pin() {
        let auth = hashed("4821");
        assert!(auth.authorize(Some("4821")).is_ok());
        match auth.authorize(Some("1234")) {
            Err(AppError::Authorization(msg)) => assert_eq!(msg, "Invalid admin PIN"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dev_pin_only_when_configured() {
        let auth = AdminAuth::new(&AdminConfig::default()).unwrap();
        assert!(auth.authorize(Some("0000")).is_err());

        let auth = AdminAuth::new(&AdminConfig {
            pin_hash: None,
            dev_pin: Some("2468".into()),
        })
        .unwrap();
        assert!(auth.authorize(Some("2468")).is_ok());
        assert!(auth.authorize(Some("0000")).is_err());
    }

    #[test]
    fn test_bad_hash_is_rejected_at_startup() {
        let config = AdminConfig {
            pin_hash: Some("plaintext".into()),
            dev_pin: None,
        };
        assert!(AdminAuth::new(&config).is_err());
    }
}
