//! Case study model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::validation::{
    sanitize_html, slugify, validate_image_list, validate_labels, validate_media_location,
};

/// Case study record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudy {
    pub id: String,
    pub title: String,
    /// Unique, derived from the title
    pub slug: String,
    pub tags: Vec<String>,
    pub description: String,
    pub thumbnail_url: String,
    pub detail_images: Vec<String>,
    pub industry: String,
    pub project_type: String,
    pub company_type: String,
    pub services: Vec<String>,
    pub order: u32,
    pub is_published: bool,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::models::timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl CaseStudy {
    /// Every media URL the record references
    pub fn media_urls(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.thumbnail_url.as_str()).chain(self.detail_images.iter().map(String::as_str))
    }
}

/// Create case study request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCaseStudy {
    #[serde(default)]
    #[validate(length(min = 5, max = 100, message = "Title must be between 5 and 100 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(
        min = 20,
        max = 1000,
        message = "Description must be between 20 and 1000 characters"
    ))]
    pub description: String,
    #[serde(default)]
    #[validate(
        length(min = 1, max = 10, message = "Between 1 and 10 tags are required"),
        custom(function = "validate_labels")
    )]
    pub tags: Vec<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 50, message = "Industry must be between 2 and 50 characters"))]
    pub industry: String,
    #[serde(default)]
    #[validate(length(min = 2, max = 50, message = "Project type must be between 2 and 50 characters"))]
    pub project_type: String,
    #[serde(default)]
    #[validate(length(min = 2, max = 50, message = "Company type must be between 2 and 50 characters"))]
    pub company_type: String,
    #[serde(default)]
    #[validate(
        length(min = 1, max = 10, message = "Between 1 and 10 services are required"),
        custom(function = "validate_labels")
    )]
    pub services: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_media_location"))]
    pub thumbnail_url: String,
    #[serde(default)]
    #[validate(
        length(max = 10, message = "Maximum 10 detail images allowed"),
        custom(function = "validate_image_list")
    )]
    pub detail_images: Vec<String>,
    #[validate(range(min = 0, message = "Order must be 0 or greater"))]
    pub order: Option<i64>,
    pub is_published: Option<bool>,
}

impl CreateCaseStudy {
    /// Strip markup from every free-text field
    pub fn sanitized(mut self) -> Self {
        self.title = sanitize_html(&self.title);
        self.description = sanitize_html(&self.description);
        self.industry = sanitize_html(&self.industry);
        self.project_type = sanitize_html(&self.project_type);
        self.company_type = sanitize_html(&self.company_type);
        self.tags = self.tags.iter().map(|t| sanitize_html(t)).collect();
        self.services = self.services.iter().map(|s| sanitize_html(s)).collect();
        self
    }

    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    pub fn into_case_study(self, id: String, now: DateTime<Utc>) -> CaseStudy {
        let slug = self.slug();
        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        CaseStudy {
            id,
            title: self.title,
            slug,
            tags,
            description: self.description,
            thumbnail_url: self.thumbnail_url,
            detail_images: self.detail_images,
            industry: self.industry,
            project_type: self.project_type,
            company_type: self.company_type,
            services: self.services,
            order: self.order.unwrap_or(0).clamp(0, u32::MAX as i64) as u32,
            is_published: self.is_published.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Update case study request (partial). The slug never changes.
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCaseStudy {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 5, max = 100, message = "Title must be between 5 and 100 characters"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(
        min = 20,
        max = 1000,
        message = "Description must be between 20 and 1000 characters"
    ))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(
        length(min = 1, max = 10, message = "Between 1 and 10 tags are required"),
        custom(function = "validate_labels")
    )]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 50, message = "Industry must be between 2 and 50 characters"))]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 50, message = "Project type must be between 2 and 50 characters"))]
    pub project_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 50, message = "Company type must be between 2 and 50 characters"))]
    pub company_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(
        length(min = 1, max = 10, message = "Between 1 and 10 services are required"),
        custom(function = "validate_labels")
    )]
    pub services: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_media_location"))]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(
        length(max = 10, message = "Maximum 10 detail images allowed"),
        custom(function = "validate_image_list")
    )]
    pub detail_images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "Order must be 0 or greater"))]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

impl UpdateCaseStudy {
    pub fn sanitized(mut self) -> Self {
        let clean = |v: Option<String>| v.map(|s| sanitize_html(&s));
        let clean_all = |v: Option<Vec<String>>| {
            v.map(|l| l.iter().map(|s| sanitize_html(s)).collect::<Vec<_>>())
        };
        self.title = clean(self.title);
        self.description = clean(self.description);
        self.industry = clean(self.industry);
        self.project_type = clean(self.project_type);
        self.company_type = clean(self.company_type);
        self.tags = clean_all(self.tags);
        self.services = clean_all(self.services);
        self
    }
}

/// Query parameters for the public case study list
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CaseQuery {
    /// Case-insensitive industry substring (`All` disables the filter)
    pub industry: Option<String>,
    /// Exact tag (`All` disables the filter)
    pub tags: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, validation::check};

    pub(crate) fn sample() -> CreateCaseStudy {
        CreateCaseStudy {
            title: "Architect Portfolio - Visual Storytelling".into(),
            description: "An immersive portfolio for an architecture studio.".into(),
            tags: vec!["UX".into(), "Visual Design".into()],
            industry: "Architecture".into(),
            project_type: "Portfolio Website".into(),
            company_type: "Design Studio".into(),
            services: vec!["Web Design".into()],
            thumbnail_url: "/assets/case-architect.jpg".into(),
            detail_images: vec!["https://cdn.example.com/detail-1.jpg".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_sample_is_valid() {
        assert!(check(&sample()).is_ok());
    }

    #[test]
    fn test_collection_bounds() {
        let mut payload = sample();
        payload.tags = vec![];
        payload.services = (0..11).map(|i| format!("service {i}")).collect();
        payload.detail_images = vec!["nope".into()];
        match check(&payload) {
            Err(AppError::Validation(violations)) => {
                let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
                assert!(fields.contains(&"tags"));
                assert!(fields.contains(&"services"));
                assert!(fields.contains(&"detailImages"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_into_case_study_derives_slug_and_dedupes_tags() {
        let mut payload = sample();
        payload.tags.push("UX".into());
        let case = payload.into_case_study("c1".into(), Utc::now());
        assert_eq!(case.slug, "architect-portfolio-visual-storytelling");
        assert_eq!(case.tags, vec!["UX".to_string(), "Visual Design".to_string()]);
        assert!(case.is_published);
        assert_eq!(case.media_urls().count(), 2);
    }
}
