//! Daily posts API endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::post::{CreateDailyPost, DailyPost, UpdateDailyPost},
    AppState,
};

use super::AdminPin;

/// List active daily posts in display order
#[utoipa::path(
    get,
    path = "/posts",
    tag = "posts",
    responses(
        (status = 200, description = "Active posts (at most 4)", body = Vec<DailyPost>)
    )
)]
pub async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<DailyPost>>> {
    let posts = state.services.posts.list().await?;
    Ok(Json(posts))
}

/// Create a daily post
#[utoipa::path(
    post,
    path = "/posts",
    tag = "posts",
    security(("admin_pin" = [])),
    request_body = CreateDailyPost,
    responses(
        (status = 201, description = "Post created", body = DailyPost),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing or invalid admin PIN"),
        (status = 409, description = "Another active post holds the requested order"),
        (status = 422, description = "Four posts are already active")
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    _admin: AdminPin,
    payload: Result<Json<CreateDailyPost>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DailyPost>)> {
    let Json(payload) = payload?;
    let post = state.services.posts.create(payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// Update a daily post
#[utoipa::path(
    patch,
    path = "/posts/{id}",
    tag = "posts",
    security(("admin_pin" = [])),
    params(("id" = String, Path, description = "Post ID")),
    request_body = UpdateDailyPost,
    responses(
        (status = 200, description = "Post updated", body = DailyPost),
        (status = 404, description = "Post not found")
    )
)]
pub async fn update_post(
    State(state): State<AppState>,
    _admin: AdminPin,
    Path(id): Path<String>,
    payload: Result<Json<UpdateDailyPost>, JsonRejection>,
) -> AppResult<Json<DailyPost>> {
    let Json(payload) = payload?;
    let post = state.services.posts.update(&id, payload).await?;
    Ok(Json(post))
}

/// Delete a daily post and its stored media
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    tag = "posts",
    security(("admin_pin" = [])),
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn delete_post(
    State(state): State<AppState>,
    _admin: AdminPin,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.services.posts.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
