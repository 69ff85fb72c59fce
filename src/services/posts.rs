//! Daily posts service

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::post::{CreateDailyPost, DailyPost, UpdateDailyPost, MAX_ACTIVE_POSTS},
    repository::{document::to_patch, posts::order_taken, Repository},
    services::media::MediaService,
    validation::check,
};

fn cap_reached() -> AppError {
    AppError::LimitReached(format!(
        "Maximum {} active posts allowed. Please delete an existing post first.",
        MAX_ACTIVE_POSTS
    ))
}

/// Lowest slot below the cap that `taken` does not hold
fn free_slot(taken: &[u32]) -> u32 {
    (0..MAX_ACTIVE_POSTS as u32)
        .find(|slot| !taken.contains(slot))
        .unwrap_or_else(|| taken.iter().max().map_or(0, |max| max + 1))
}

#[derive(Clone)]
pub struct PostsService {
    repository: Repository,
    media: MediaService,
}

impl PostsService {
    pub fn new(repository: Repository, media: MediaService) -> Self {
        Self { repository, media }
    }

    pub async fn list(&self) -> AppResult<Vec<DailyPost>> {
        self.repository.posts.list_active().await
    }

    /// Create a post, active unless the payload says otherwise. Without an
    /// explicit `order` it takes the lowest free slot.
    pub async fn create(&self, payload: CreateDailyPost) -> AppResult<DailyPost> {
        let payload = payload.sanitized();
        check(&payload)?;

        let taken = self.repository.posts.active_orders().await?;
        let activate = payload.is_active.unwrap_or(true);
        if activate && taken.len() as u64 >= MAX_ACTIVE_POSTS {
            return Err(cap_reached());
        }
        let order = match payload.order {
            Some(order) => {
                let order = order as u32;
                if activate && taken.contains(&order) {
                    return Err(order_taken(order));
                }
                order
            }
            None => free_slot(&taken),
        };

        let post = payload.into_post(Uuid::new_v4().to_string(), order, Utc::now());
        self.repository.posts.create(&post).await?;
        tracing::info!(post_id = %post.id, order = post.order, active = post.is_active, "Created daily post");
        Ok(post)
    }

    pub async fn update(&self, id: &str, payload: UpdateDailyPost) -> AppResult<DailyPost> {
        let payload = payload.sanitized();
        check(&payload)?;

        if payload.is_active == Some(true) {
            let current = self.repository.posts.get_by_id(id).await?;
            if !current.is_active && self.repository.posts.count_active().await? >= MAX_ACTIVE_POSTS {
                return Err(cap_reached());
            }
        }

        let mut patch = to_patch(&payload)?;
        if patch.get("mediaUrl").and_then(Value::as_str) == Some("") {
            patch.insert("mediaUrl".to_string(), Value::Null);
        }
        self.repository.posts.update(id, patch, Utc::now()).await
    }

    /// Delete a post and, best effort, its stored media
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let post = self.repository.posts.get_by_id(id).await?;
        if let Some(url) = post.media_url.as_deref() {
            self.media.cleanup([url]).await;
        }
        self.repository.posts.delete(id).await
    }
}
