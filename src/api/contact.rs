//! Contact form and inquiry management endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::inquiry::{
        ContactInquiry, ContactSubmission, InquiryPage, InquiryQuery, SubmissionReceipt, UpdateInquiry,
    },
    AppState,
};

use super::{AdminPin, ClientInfo};

/// Submit the public contact form
#[utoipa::path(
    post,
    path = "/contact",
    tag = "contact",
    request_body = ContactSubmission,
    params(
        ("utm_source" = Option<String>, Query, description = "Campaign source"),
        ("utm_medium" = Option<String>, Query, description = "Campaign medium"),
        ("utm_campaign" = Option<String>, Query, description = "Campaign name")
    ),
    responses(
        (status = 201, description = "Inquiry received", body = SubmissionReceipt),
        (status = 400, description = "Invalid submission", body = crate::error::ErrorResponse),
        (status = 429, description = "Too many submissions", body = crate::error::ErrorResponse)
    )
)]
pub async fn submit(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    payload: Result<Json<ContactSubmission>, JsonRejection>,
) -> AppResult<(StatusCode, Json<SubmissionReceipt>)> {
    let Json(payload) = payload?;
    let inquiry = state.services.inquiries.submit(payload, client).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmissionReceipt {
            success: true,
            message: "Thank you! We'll be in touch within 24 hours.".to_string(),
            inquiry_id: inquiry.id,
        }),
    ))
}

/// List inquiries, newest first
#[utoipa::path(
    get,
    path = "/contact",
    tag = "contact",
    security(("admin_pin" = [])),
    params(InquiryQuery),
    responses(
        (status = 200, description = "Inquiry page", body = InquiryPage)
    )
)]
pub async fn list_inquiries(
    State(state): State<AppState>,
    _admin: AdminPin,
    Query(query): Query<InquiryQuery>,
) -> AppResult<Json<InquiryPage>> {
    let page = state.services.inquiries.list(&query).await?;
    Ok(Json(page))
}

/// Update an inquiry's status or notes
#[utoipa::path(
    patch,
    path = "/contact/{id}",
    tag = "contact",
    security(("admin_pin" = [])),
    params(("id" = String, Path, description = "Inquiry ID")),
    request_body = UpdateInquiry,
    responses(
        (status = 200, description = "Inquiry updated", body = ContactInquiry),
        (status = 404, description = "Inquiry not found")
    )
)]
pub async fn update_inquiry(
    State(state): State<AppState>,
    _admin: AdminPin,
    Path(id): Path<String>,
    payload: Result<Json<UpdateInquiry>, JsonRejection>,
) -> AppResult<Json<ContactInquiry>> {
    let Json(payload) = payload?;
    let inquiry = state.services.inquiries.update(&id, payload).await?;
    Ok(Json(inquiry))
}

/// Delete an inquiry
#[utoipa::path(
    delete,
    path = "/contact/{id}",
    tag = "contact",
    security(("admin_pin" = [])),
    params(("id" = String, Path, description = "Inquiry ID")),
    responses(
        (status = 204, description = "Inquiry deleted"),
        (status = 404, description = "Inquiry not found")
    )
)]
pub async fn delete_inquiry(
    State(state): State<AppState>,
    _admin: AdminPin,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.services.inquiries.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
