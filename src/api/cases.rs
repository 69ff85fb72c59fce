//! Case studies API endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::case_study::{CaseQuery, CaseStudy, CreateCaseStudy, UpdateCaseStudy},
    AppState,
};

use super::AdminPin;

/// List published case studies
#[utoipa::path(
    get,
    path = "/cases",
    tag = "cases",
    params(CaseQuery),
    responses(
        (status = 200, description = "Published case studies", body = Vec<CaseStudy>)
    )
)]
pub async fn list_cases(
    State(state): State<AppState>,
    Query(query): Query<CaseQuery>,
) -> AppResult<Json<Vec<CaseStudy>>> {
    let cases = state.services.cases.list(&query).await?;
    Ok(Json(cases))
}

/// Get a published case study by slug
#[utoipa::path(
    get,
    path = "/cases/{slug}",
    tag = "cases",
    params(("slug" = String, Path, description = "Case study slug")),
    responses(
        (status = 200, description = "Case study", body = CaseStudy),
        (status = 404, description = "Case study not found")
    )
)]
pub async fn get_case(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<CaseStudy>> {
    let case = state.services.cases.get(&slug).await?;
    Ok(Json(case))
}

/// Create a case study; the slug is derived from the title
#[utoipa::path(
    post,
    path = "/cases",
    tag = "cases",
    security(("admin_pin" = [])),
    request_body = CreateCaseStudy,
    responses(
        (status = 201, description = "Case study created", body = CaseStudy),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Slug already in use")
    )
)]
pub async fn create_case(
    State(state): State<AppState>,
    _admin: AdminPin,
    payload: Result<Json<CreateCaseStudy>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CaseStudy>)> {
    let Json(payload) = payload?;
    let case = state.services.cases.create(payload).await?;
    Ok((StatusCode::CREATED, Json(case)))
}

/// Update a case study
#[utoipa::path(
    patch,
    path = "/cases/{slug}",
    tag = "cases",
    security(("admin_pin" = [])),
    params(("slug" = String, Path, description = "Case study slug")),
    request_body = UpdateCaseStudy,
    responses(
        (status = 200, description = "Case study updated", body = CaseStudy),
        (status = 404, description = "Case study not found")
    )
)]
pub async fn update_case(
    State(state): State<AppState>,
    _admin: AdminPin,
    Path(slug): Path<String>,
    payload: Result<Json<UpdateCaseStudy>, JsonRejection>,
) -> AppResult<Json<CaseStudy>> {
    let Json(payload) = payload?;
    let case = state.services.cases.update(&slug, payload).await?;
    Ok(Json(case))
}

/// Delete a case study and its stored images
#[utoipa::path(
    delete,
    path = "/cases/{slug}",
    tag = "cases",
    security(("admin_pin" = [])),
    params(("slug" = String, Path, description = "Case study slug")),
    responses(
        (status = 204, description = "Case study deleted"),
        (status = 404, description = "Case study not found")
    )
)]
pub async fn delete_case(
    State(state): State<AppState>,
    _admin: AdminPin,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    state.services.cases.delete(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
