//! Reviews, cached per listing

use std::collections::HashSet;

use shared::EntityId;
use shared::models::{Review, ReviewCreate};

use super::{Gateway, find_created};
use crate::error::ClientResult;
use crate::http::ApiRequest;
use crate::payload;

const LIST_KEYS: &[&str] = &["reviews", "items", "results"];
const ENTITY_KEYS: &[&str] = &["review"];

impl Gateway {
    /// Cached reviews of one listing
    pub async fn reviews(&self, department_id: impl Into<EntityId>) -> Vec<Review> {
        let id = department_id.into();
        self.inner
            .caches
            .reviews
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn fetch_reviews(
        &self,
        department_id: impl Into<EntityId>,
    ) -> ClientResult<Vec<Review>> {
        let id = department_id.into();
        let body = self
            .send(
                "fetch_reviews",
                ApiRequest::get(format!("departments/{}/reviews", id)),
            )
            .await?;
        let mut reviews: Vec<Review> = payload::list_of(body, LIST_KEYS, "reviews")?;
        for review in reviews.iter_mut().filter(|r| r.department_id.is_empty()) {
            review.department_id = id.clone();
        }
        self.inner
            .caches
            .reviews
            .write()
            .await
            .insert(id, reviews.clone());
        Ok(reviews)
    }

    pub async fn create_review(
        &self,
        department_id: impl Into<EntityId>,
        create: ReviewCreate,
    ) -> ClientResult<Review> {
        let id = department_id.into();
        self.require_token()?;
        create.validate()?;

        let known: HashSet<EntityId> = self
            .reviews(id.clone())
            .await
            .into_iter()
            .map(|review| review.id)
            .collect();
        let request = ApiRequest::post(format!("departments/{}/reviews", id)).json(&create)?;
        let body = self.send("create_review", request).await?;
        let Some(mut review) = payload::entity_of::<Review>(body, ENTITY_KEYS) else {
            return Ok(self.resolve_created_review(&id, &known, create).await);
        };
        if review.department_id.is_empty() {
            review.department_id = id.clone();
        }

        let mut reviews = self.inner.caches.reviews.write().await;
        let entry = reviews.entry(id).or_default();
        match entry.iter_mut().find(|existing| existing.id == review.id) {
            Some(existing) => *existing = review.clone(),
            None => entry.push(review.clone()),
        }
        Ok(review)
    }

    /// Created on the server but not echoed: re-read the listing's reviews
    async fn resolve_created_review(
        &self,
        department_id: &EntityId,
        known: &HashSet<EntityId>,
        create: ReviewCreate,
    ) -> Review {
        match self.fetch_reviews(department_id).await {
            Ok(reviews) => {
                if let Some(review) = find_created(known, reviews, |r| {
                    r.rating == create.rating && r.comment == create.comment
                }) {
                    return review;
                }
                tracing::warn!("Created review not found after re-fetch");
            }
            Err(e) => tracing::warn!(error = %e, "Re-fetch after create failed"),
        }
        Review {
            id: EntityId::default(),
            department_id: department_id.clone(),
            user_name: None,
            rating: create.rating,
            comment: create.comment,
            created_at: String::new(),
        }
    }
}
