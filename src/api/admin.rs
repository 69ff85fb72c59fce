//! Admin login check and datastore maintenance endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::{
    error::AppResult,
    services::admin::{InitReport, PinRequest},
    AppState,
};

use super::{client_ip, AdminPin};

/// Check an admin PIN (used by the admin login form)
#[utoipa::path(
    post,
    path = "/admin/verify-pin",
    tag = "admin",
    request_body = PinRequest,
    responses(
        (status = 204, description = "PIN accepted"),
        (status = 400, description = "PIN is not 4 digits"),
        (status = 401, description = "Invalid PIN"),
        (status = 429, description = "Too many attempts")
    )
)]
pub async fn verify_pin(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PinRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(request) = payload?;
    state
        .services
        .admin
        .verify_pin(&request, &client_ip(&headers))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ensure indexes on the primary store and seed sample case studies
#[utoipa::path(
    post,
    path = "/admin/init-db",
    tag = "admin",
    security(("admin_pin" = [])),
    responses(
        (status = 200, description = "Datastore initialized", body = InitReport),
        (status = 503, description = "No reachable primary datastore")
    )
)]
pub async fn init_db(State(state): State<AppState>, _admin: AdminPin) -> AppResult<Json<InitReport>> {
    let report = state.services.admin.init_db().await?;
    Ok(Json(report))
}
