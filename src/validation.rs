//! Input sanitization and schema validation helpers
//!
//! Payload structs derive [`validator::Validate`]; [`check`] turns every
//! violated constraint into an itemized [`AppError::Validation`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, AppResult, FieldViolation};

/// Letters, spaces, hyphens and apostrophes
pub static PERSON_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\s'-]+$").expect("valid name regex"));

/// Optional leading `+`, then digits, spaces, hyphens and parentheses
pub static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9\s\-()]+$").expect("valid phone regex"));

pub static ADMIN_PIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("valid pin regex"));

static ANGLE_BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[<>]").expect("valid regex"));
static JS_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)javascript:").expect("valid regex"));
static EVENT_HANDLER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)on\w+=").expect("valid regex"));
static FILENAME_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9.-]").expect("valid regex"));
static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").expect("valid regex"));

/// Strip angle brackets, `javascript:` schemes and inline event handlers.
///
/// Applied repeatedly until nothing changes, so sanitizing an already
/// sanitized value is a no-op.
pub fn sanitize_html(input: &str) -> String {
    let mut current = input.trim().to_string();
    loop {
        let next = ANGLE_BRACKETS.replace_all(&current, "");
        let next = JS_SCHEME.replace_all(&next, "");
        let next = EVENT_HANDLER.replace_all(&next, "");
        let next = next.trim().to_string();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Restrict a filename to `[a-z0-9._-]`
pub fn sanitize_filename(filename: &str) -> String {
    let replaced = FILENAME_UNSAFE.replace_all(filename, "_");
    let collapsed = UNDERSCORE_RUNS.replace_all(&replaced, "_");
    let lowered = collapsed.to_lowercase();
    if lowered.is_empty() {
        "file".to_string()
    } else {
        lowered
    }
}

/// Derive a URL-safe slug: lowercase, runs of non-alphanumerics collapsed
/// to one hyphen, no leading or trailing hyphen.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Accepts absolute http(s) URLs and site asset paths
pub fn validate_media_location(value: &str) -> Result<(), ValidationError> {
    if value.starts_with("/assets/") {
        return Ok(());
    }
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(error("url", "Please provide a valid URL or asset path")),
    }
}

/// Like [`validate_media_location`] but also accepts an empty string
pub fn validate_optional_media_location(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    validate_media_location(value)
}

pub fn validate_labels(labels: &[String]) -> Result<(), ValidationError> {
    if labels
        .iter()
        .any(|label| label.trim().is_empty() || label.chars().count() > 50)
    {
        return Err(error("label", "Each entry must be between 1 and 50 characters"));
    }
    Ok(())
}

pub fn validate_image_list(images: &[String]) -> Result<(), ValidationError> {
    for image in images {
        validate_media_location(image)?;
    }
    Ok(())
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Run a payload's schema and collect every violation
pub fn check<T: Validate>(payload: &T) -> AppResult<()> {
    payload.validate().map_err(|errors| AppError::Validation(violations(&errors)))
}

/// Flatten validator errors into field violations, sorted by field name
pub fn violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut out: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = camel_case(&field);
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", e.code));
                FieldViolation::new(field.clone(), message)
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

/// `media_type` -> `mediaType`, matching the JSON field names
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Merge extra violations into a schema result
pub fn check_with<T: Validate>(payload: &T, mut extra: Vec<FieldViolation>) -> AppResult<()> {
    if let Err(AppError::Validation(mut found)) = check(payload) {
        found.append(&mut extra);
        return Err(AppError::Validation(found));
    }
    if extra.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(extra))
    }
}
