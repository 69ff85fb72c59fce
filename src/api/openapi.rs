//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, cases, contact, health, posts, upload};
use crate::services::auth::ADMIN_PIN_HEADER;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Folio API",
        version = "0.3.0",
        description = "Portfolio site content API: daily posts, case studies and contact inquiries",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Posts
        posts::list_posts,
        posts::create_post,
        posts::update_post,
        posts::delete_post,
        // Cases
        cases::list_cases,
        cases::get_case,
        cases::create_case,
        cases::update_case,
        cases::delete_case,
        // Contact
        contact::submit,
        contact::list_inquiries,
        contact::update_inquiry,
        contact::delete_inquiry,
        // Upload
        upload::upload_file,
        // Admin
        admin::verify_pin,
        admin::init_db,
    ),
    components(
        schemas(
            // Posts
            crate::models::post::DailyPost,
            crate::models::post::MediaType,
            crate::models::post::CreateDailyPost,
            crate::models::post::UpdateDailyPost,
            // Cases
            crate::models::case_study::CaseStudy,
            crate::models::case_study::CreateCaseStudy,
            crate::models::case_study::UpdateCaseStudy,
            // Contact
            crate::models::inquiry::ContactInquiry,
            crate::models::inquiry::InquiryStatus,
            crate::models::inquiry::ContactSubmission,
            crate::models::inquiry::UpdateInquiry,
            crate::models::inquiry::InquiryPage,
            crate::models::inquiry::SubmissionReceipt,
            // Upload
            crate::models::upload::UploadResponse,
            crate::models::upload::UploadForm,
            // Admin
            crate::services::admin::PinRequest,
            crate::services::admin::InitReport,
            crate::repository::Backend,
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::FieldViolation,
        )
    ),
    modifiers(&AdminPinScheme),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "posts", description = "Daily posts"),
        (name = "cases", description = "Case studies"),
        (name = "contact", description = "Contact form and inquiries"),
        (name = "upload", description = "Media uploads"),
        (name = "admin", description = "Admin login and maintenance")
    )
)]
pub struct ApiDoc;

/// Registers the `admin_pin` header scheme used by mutating endpoints
struct AdminPinScheme;

impl Modify for AdminPinScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_pin",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(ADMIN_PIN_HEADER))),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/posts/{id}", "/cases/{slug}", "/contact", "/upload", "/admin/init-db"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("admin_pin"));
    }
}
