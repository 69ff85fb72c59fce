//! Data models for Folio

pub mod case_study;
pub mod inquiry;
pub mod post;
pub mod timestamp;
pub mod upload;

// Re-export commonly used types
pub use case_study::CaseStudy;
pub use inquiry::{ContactInquiry, InquiryStatus};
pub use post::{DailyPost, MediaType};
pub use upload::UploadResponse;
