//! API handlers for the Folio REST endpoints

pub mod admin;
pub mod cases;
pub mod contact;
pub mod health;
pub mod openapi;
pub mod posts;
pub mod upload;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts, Query},
    http::{
        header::{REFERER, USER_AGENT},
        request::Parts,
        HeaderMap, HeaderName,
    },
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::AppError,
    models::inquiry::ClientMetadata,
    services::auth::ADMIN_PIN_HEADER,
    AppState,
};

/// Body cap on the upload route. Files between this and the per-file
/// limit are rejected by upload validation.
const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Extractor that admits only requests carrying a valid admin PIN
pub struct AdminPin;

#[async_trait]
impl FromRequestParts<AppState> for AdminPin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let pin = parts
            .headers
            .get(ADMIN_PIN_HEADER)
            .and_then(|value| value.to_str().ok());

        state.services.admin.authorize(pin)?;
        Ok(AdminPin)
    }
}

#[derive(Debug, Default, Deserialize)]
struct UtmParams {
    utm_source: Option<String>,
    utm_medium: Option<String>,
    utm_campaign: Option<String>,
}

/// Client address: first `x-forwarded-for` hop, then `x-real-ip`
pub fn client_ip(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    header("x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| header("x-real-ip").map(|v| v.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_or(headers: &HeaderMap, name: HeaderName, default: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

/// Request metadata recorded with public submissions
pub struct ClientInfo(pub ClientMetadata);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let utm = Query::<UtmParams>::try_from_uri(&parts.uri)
            .map(|Query(params)| params)
            .unwrap_or_default();

        Ok(ClientInfo(ClientMetadata {
            ip_address: client_ip(&parts.headers),
            user_agent: header_or(&parts.headers, USER_AGENT, "unknown"),
            referrer: header_or(&parts.headers, REFERER, "direct"),
            utm_source: utm.utm_source,
            utm_medium: utm.utm_medium,
            utm_campaign: utm.utm_campaign,
        }))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Daily posts
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/:id", patch(posts::update_post).delete(posts::delete_post))
        // Case studies
        .route("/cases", get(cases::list_cases).post(cases::create_case))
        .route(
            "/cases/:slug",
            get(cases::get_case)
                .patch(cases::update_case)
                .delete(cases::delete_case),
        )
        // Contact inquiries
        .route("/contact", post(contact::submit).get(contact::list_inquiries))
        .route(
            "/contact/:id",
            patch(contact::update_inquiry).delete(contact::delete_inquiry),
        )
        // Uploads
        .route(
            "/upload",
            post(upload::upload_file).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        // Admin
        .route("/admin/verify-pin", post(admin::verify_pin))
        .route("/admin/init-db", post(admin::init_db))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_ip(&headers), "10.0.0.9");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }
}
