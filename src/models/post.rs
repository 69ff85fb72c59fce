//! Daily post model (the homepage "today" strip)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::validation::{sanitize_html, validate_optional_media_location};

/// At most this many posts may be active at once
pub const MAX_ACTIVE_POSTS: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Gif,
}

impl FromStr for MediaType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            "gif" => Ok(MediaType::Gif),
            _ => Err(()),
        }
    }
}

fn validate_media_type(value: &str) -> Result<(), ValidationError> {
    MediaType::from_str(value).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("enum");
        err.message = Some("Media type must be one of: image, video, gif".into());
        err
    })
}

/// Daily post record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyPost {
    pub id: String,
    pub title: String,
    pub description: String,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    /// Size of the uploaded media in bytes
    pub file_size: Option<u64>,
    /// Display position, 0-based
    pub order: u32,
    pub is_active: bool,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::models::timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Create daily post request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDailyPost {
    #[serde(default)]
    #[validate(length(min = 5, max = 100, message = "Title must be between 5 and 100 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(
        min = 10,
        max = 500,
        message = "Description must be between 10 and 500 characters"
    ))]
    pub description: String,
    #[validate(custom(function = "validate_optional_media_location"))]
    pub media_url: Option<String>,
    /// One of `image`, `video`, `gif`
    #[validate(custom(function = "validate_media_type"))]
    pub media_type: Option<String>,
    pub file_size: Option<u64>,
    #[validate(range(min = 0, max = 3, message = "Maximum 4 posts allowed (order 0-3)"))]
    pub order: Option<i64>,
    pub is_active: Option<bool>,
}

impl CreateDailyPost {
    /// Strip markup from the free-text fields
    pub fn sanitized(mut self) -> Self {
        self.title = sanitize_html(&self.title);
        self.description = sanitize_html(&self.description);
        self
    }

    /// Build the record; `order` is the slot assigned by the caller
    pub fn into_post(self, id: String, order: u32, now: DateTime<Utc>) -> DailyPost {
        DailyPost {
            id,
            title: self.title,
            description: self.description,
            media_url: self.media_url.filter(|url| !url.is_empty()),
            media_type: self.media_type.as_deref().and_then(|t| t.parse().ok()),
            file_size: self.file_size,
            order,
            is_active: self.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Update daily post request (partial)
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDailyPost {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 5, max = 100, message = "Title must be between 5 and 100 characters"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(
        min = 10,
        max = 500,
        message = "Description must be between 10 and 500 characters"
    ))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_optional_media_location"))]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_media_type"))]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 3, message = "Maximum 4 posts allowed (order 0-3)"))]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UpdateDailyPost {
    pub fn sanitized(mut self) -> Self {
        self.title = self.title.map(|t| sanitize_html(&t));
        self.description = self.description.map(|d| sanitize_html(&d));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, validation::check};

    fn valid() -> CreateDailyPost {
        CreateDailyPost {
            title: "Morning sketch".into(),
            description: "Wireframes for the new landing page".into(),
            media_type: Some("image".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_post_passes() {
        assert!(check(&valid()).is_ok());
    }

    #[test]
    fn test_every_violation_is_reported() {
        let payload = CreateDailyPost {
            title: "Hi".into(),
            description: "short".into(),
            media_type: Some("audio".into()),
            order: Some(4),
            ..Default::default()
        };
        match check(&payload) {
            Err(AppError::Validation(violations)) => {
                let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
                assert_eq!(fields, vec!["description", "mediaType", "order", "title"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_into_post_drops_empty_media_url() {
        let mut payload = valid();
        payload.media_url = Some(String::new());
        let post = payload.into_post("p1".into(), 2, Utc::now());
        assert_eq!(post.media_url, None);
        assert_eq!(post.media_type, Some(MediaType::Image));
        assert_eq!(post.order, 2);
        assert!(post.is_active);
    }

    #[test]
    fn test_into_post_keeps_requested_inactive_flag() {
        let mut payload = valid();
        payload.is_active = Some(false);
        assert!(!payload.into_post("p2".into(), 0, Utc::now()).is_active);
    }
}
