//! Contact inquiry model (leads from the public contact form)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::validation::{sanitize_html, PERSON_NAME, PHONE};

pub const CONTACT_FORM_SOURCE: &str = "contact_form";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    New,
    Contacted,
    Converted,
    Closed,
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::New => "new",
            InquiryStatus::Contacted => "contacted",
            InquiryStatus::Converted => "converted",
            InquiryStatus::Closed => "closed",
        }
    }
}

impl FromStr for InquiryStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(InquiryStatus::New),
            "contacted" => Ok(InquiryStatus::Contacted),
            "converted" => Ok(InquiryStatus::Converted),
            "closed" => Ok(InquiryStatus::Closed),
            _ => Err(()),
        }
    }
}

pub(crate) fn validate_status(value: &str) -> Result<(), ValidationError> {
    InquiryStatus::from_str(value).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("enum");
        err.message = Some("Status must be one of: new, contacted, converted, closed".into());
        err
    })
}

/// Contact inquiry record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactInquiry {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: Option<String>,
    pub message: Option<String>,
    pub status: InquiryStatus,
    /// Where the inquiry came from (always `contact_form` today)
    pub source: String,
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::models::timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, with = "crate::models::timestamp::option")]
    pub contacted_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Request metadata captured alongside a submission
#[derive(Debug, Clone, Default)]
pub struct ClientMetadata {
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

/// Public contact form submission
#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
pub struct ContactSubmission {
    #[serde(default)]
    #[validate(
        length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"),
        regex(
            path = *PERSON_NAME,
            message = "Name can only contain letters, spaces, hyphens, and apostrophes"
        )
    )]
    pub name: String,
    #[serde(default)]
    #[validate(
        email(message = "Please enter a valid email address"),
        length(max = 255, message = "Email must be less than 255 characters")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(
        length(min = 10, max = 20, message = "Phone number must be between 10 and 20 characters"),
        regex(path = *PHONE, message = "Please enter a valid phone number")
    )]
    pub phone: String,
    #[validate(length(max = 100, message = "Service selection must be less than 100 characters"))]
    pub service: Option<String>,
    #[validate(length(max = 2000, message = "Message must be less than 2000 characters"))]
    pub message: Option<String>,
}

impl ContactSubmission {
    /// Sanitize free text and normalize contact fields
    pub fn normalized(self) -> Self {
        let optional = |v: Option<String>| {
            v.map(|s| sanitize_html(&s)).filter(|s| !s.is_empty())
        };
        Self {
            name: sanitize_html(&self.name),
            email: self.email.trim().to_lowercase(),
            phone: self.phone.trim().to_string(),
            service: optional(self.service),
            message: optional(self.message),
        }
    }

    pub fn into_inquiry(self, id: String, client: ClientMetadata, now: DateTime<Utc>) -> ContactInquiry {
        ContactInquiry {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            service: self.service,
            message: self.message,
            status: InquiryStatus::New,
            source: CONTACT_FORM_SOURCE.to_string(),
            ip_address: client.ip_address,
            user_agent: client.user_agent,
            referrer: client.referrer,
            utm_source: client.utm_source,
            utm_medium: client.utm_medium,
            utm_campaign: client.utm_campaign,
            created_at: now,
            updated_at: now,
            contacted_at: None,
            notes: None,
        }
    }
}

/// Admin update of an inquiry (partial)
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInquiry {
    /// One of `new`, `contacted`, `converted`, `closed`
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_status"))]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "Notes must be less than 2000 characters"))]
    pub notes: Option<String>,
}

impl UpdateInquiry {
    pub fn sanitized(mut self) -> Self {
        self.notes = self.notes.map(|n| sanitize_html(&n));
        self
    }

    pub fn moves_to_contacted(&self) -> bool {
        self.status.as_deref() == Some(InquiryStatus::Contacted.as_str())
    }
}

/// Query parameters for the admin inquiry list
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct InquiryQuery {
    /// Status filter; `all` disables it
    pub status: Option<String>,
    /// Page size (default 50, max 200)
    pub limit: Option<u64>,
    /// Number of records to skip
    pub skip: Option<u64>,
}

/// One page of the admin inquiry list
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InquiryPage {
    pub inquiries: Vec<ContactInquiry>,
    pub total: u64,
    pub has_more: bool,
}

/// Response to a public contact submission
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub success: bool,
    pub message: String,
    pub inquiry_id: String,
}
