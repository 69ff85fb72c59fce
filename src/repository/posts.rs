//! Daily posts repository

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::document::{decode, decode_all, encode, Filter, FindOptions, StoreError, DAILY_POSTS};
use super::router::{Datastore, WritePolicy};
use crate::{
    error::{AppError, AppResult},
    models::{
        post::{DailyPost, MAX_ACTIVE_POSTS},
        timestamp,
    },
};

/// Posts are only written to the primary when one is configured
const WRITES: WritePolicy = WritePolicy::PrimaryOnly;

fn active() -> Filter {
    Filter::new().eq("isActive", true)
}

pub(crate) fn order_taken(order: u32) -> AppError {
    AppError::Conflict(format!("Order {} is already taken by another active post", order))
}

#[derive(Clone)]
pub struct PostsRepository {
    store: Datastore,
}

impl PostsRepository {
    pub fn new(store: Datastore) -> Self {
        Self { store }
    }

    /// Active posts in display order
    pub async fn list_active(&self) -> AppResult<Vec<DailyPost>> {
        let options = FindOptions::new()
            .sort_asc("order")
            .sort_desc("createdAt")
            .limit(MAX_ACTIVE_POSTS);
        let docs = self.store.find(DAILY_POSTS, &active(), &options).await?;
        decode_all(docs)
    }

    /// Number of active posts in the store that would take a write
    pub async fn count_active(&self) -> AppResult<u64> {
        Ok(self.store.count_for_write(DAILY_POSTS, &active(), WRITES).await?)
    }

    /// Display slots held by active posts, ascending
    pub async fn active_orders(&self) -> AppResult<Vec<u32>> {
        let docs = self
            .store
            .find_for_write(DAILY_POSTS, &active(), &FindOptions::new().sort_asc("order"), WRITES)
            .await?;
        Ok(decode_all::<DailyPost>(docs)?
            .into_iter()
            .map(|post| post.order)
            .collect())
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<DailyPost> {
        self.store
            .find_one_for_write(DAILY_POSTS, &Filter::by_id(id), WRITES)
            .await?
            .map(decode)
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("Post with id {} not found", id)))
    }

    /// Insert the post. Active posts are refused once the cap is reached
    /// or when their slot is taken.
    pub async fn create(&self, post: &DailyPost) -> AppResult<()> {
        let doc = encode(post)?;
        let inserted = if post.is_active {
            self.store
                .insert_one_capped(DAILY_POSTS, doc, &active(), MAX_ACTIVE_POSTS, WRITES)
                .await
        } else {
            self.store.insert_one(DAILY_POSTS, doc, WRITES).await.map(|()| true)
        };
        match inserted {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::LimitReached(format!(
                "Maximum {} active posts allowed. Please delete an existing post first.",
                MAX_ACTIVE_POSTS
            ))),
            Err(StoreError::Duplicate(_)) => Err(order_taken(post.order)),
            Err(e) => Err(e.into()),
        }
    }

    /// Merge `patch` into the post and stamp `updatedAt`
    pub async fn update(
        &self,
        id: &str,
        mut patch: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> AppResult<DailyPost> {
        let order = patch.get("order").and_then(Value::as_u64);
        patch.insert("updatedAt".to_string(), timestamp::to_value(now));
        let updated = match self
            .store
            .update_one(DAILY_POSTS, &Filter::by_id(id), patch, WRITES)
            .await
        {
            Ok(updated) => updated,
            Err(StoreError::Duplicate(_)) => {
                return Err(match order {
                    Some(order) => order_taken(order as u32),
                    None => AppError::Conflict("Another active post already uses this order".to_string()),
                })
            }
            Err(e) => return Err(e.into()),
        };
        updated
            .map(decode)
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("Post with id {} not found", id)))
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let deleted = self
            .store
            .delete_one(DAILY_POSTS, &Filter::by_id(id), WRITES)
            .await?;
        if !deleted {
            return Err(AppError::NotFound(format!("Post with id {} not found", id)));
        }
        Ok(())
    }
}
