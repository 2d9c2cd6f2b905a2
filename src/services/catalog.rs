use chrono::NaiveDate;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{
        apply_action, next_action, Perfume, PerfumeKey, Post, Review, ScentFamily, UserAction,
    },
};

const SEED_JSON: &str = include_str!("../../data/catalog.json");
const PURCHASE_BASE_URL: &str = "https://www.amazon.com/s";
const REVIEW_AUTHOR: &str = "You";

#[derive(Debug, Deserialize)]
struct FamilySeed {
    name: String,
    description: String,
}

/// The embedded seed document
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSeed {
    perfumes: Vec<Perfume>,
    scent_families: Vec<FamilySeed>,
    common_notes: Vec<String>,
    trending: Vec<String>,
    pub posts: Vec<Post>,
}

impl CatalogSeed {
    pub fn embedded() -> serde_json::Result<Self> {
        serde_json::from_str(SEED_JSON)
    }
}

/// Result of a like/dislike transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingOutcome {
    pub action: Option<UserAction>,
    pub likes: u32,
    pub dislikes: u32,
}

/// The static catalog plus the session's mutations of it
///
/// Items are never added or removed. Counters and reviews change, and only
/// through [`Catalog::rate`] and [`Catalog::add_review`].
#[derive(Debug)]
pub struct Catalog {
    perfumes: Vec<Perfume>,
    families: Vec<FamilySeed>,
    common_notes: Vec<String>,
    trending: Vec<String>,
    user_actions: HashMap<PerfumeKey, UserAction>,
}

impl Catalog {
    pub fn from_seed(seed: CatalogSeed) -> (Self, Vec<Post>) {
        let catalog = Self {
            perfumes: seed.perfumes,
            families: seed.scent_families,
            common_notes: seed.common_notes,
            trending: seed.trending,
            user_actions: HashMap::new(),
        };
        (catalog, seed.posts)
    }

    /// Blank term returns everything in catalog order
    pub fn search(&self, term: &str) -> Vec<Perfume> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.perfumes.clone();
        }
        self.perfumes
            .iter()
            .filter(|p| p.matches(&term))
            .cloned()
            .collect()
    }

    pub fn trending(&self) -> Vec<Perfume> {
        self.perfumes
            .iter()
            .filter(|p| self.trending.iter().any(|name| *name == p.name))
            .cloned()
            .collect()
    }

    pub fn families(&self) -> Vec<ScentFamily> {
        self.families
            .iter()
            .map(|family| ScentFamily {
                name: family.name.clone(),
                description: family.description.clone(),
                perfumes: self
                    .perfumes
                    .iter()
                    .filter(|p| p.family.as_deref() == Some(family.name.as_str()))
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    pub fn common_notes(&self) -> &[String] {
        &self.common_notes
    }

    pub fn find(&self, key: &PerfumeKey) -> AppResult<&Perfume> {
        self.perfumes
            .iter()
            .find(|p| p.is(key))
            .ok_or_else(|| AppError::NotFound(format!("No perfume named {}", key)))
    }

    fn find_mut(&mut self, key: &PerfumeKey) -> AppResult<&mut Perfume> {
        self.perfumes
            .iter_mut()
            .find(|p| p.is(key))
            .ok_or_else(|| AppError::NotFound(format!("No perfume named {}", key)))
    }

    pub fn user_action(&self, key: &PerfumeKey) -> Option<UserAction> {
        self.user_actions.get(key).copied()
    }

    /// Like/dislike with toggle semantics. The recorded action and both counters
    /// change together under the caller's write lock.
    pub fn rate(&mut self, key: &PerfumeKey, requested: UserAction) -> AppResult<RatingOutcome> {
        let old = self.user_action(key);
        let new = next_action(old, requested);

        let perfume = self.find_mut(key)?;
        let counters = apply_action(old, new, perfume.counters());
        perfume.set_counters(counters);

        match new {
            Some(action) => self.user_actions.insert(key.clone(), action),
            None => self.user_actions.remove(key),
        };

        tracing::info!(
            perfume = %key,
            action = ?new,
            likes = counters.likes,
            dislikes = counters.dislikes,
            "Rating updated"
        );

        Ok(RatingOutcome {
            action: new,
            likes: counters.likes,
            dislikes: counters.dislikes,
        })
    }

    /// Prepends a review authored by the current user
    pub fn add_review(
        &mut self,
        key: &PerfumeKey,
        rating: i64,
        comment: &str,
        today: NaiveDate,
    ) -> AppResult<Review> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation(
                "Rating must be between 1 and 5.".to_string(),
            ));
        }
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(AppError::Validation(
                "Please write a comment for your review.".to_string(),
            ));
        }

        let review = Review {
            author: REVIEW_AUTHOR.to_string(),
            rating: rating as u8,
            comment: comment.to_string(),
            date: today,
        };
        self.find_mut(key)?.reviews.insert(0, review.clone());
        Ok(review)
    }

    /// `None` when the item has no purchase search term
    pub fn purchase_link(&self, key: &PerfumeKey, default_tag: &str) -> AppResult<Option<String>> {
        let perfume = self.find(key)?;
        let Some(term) = perfume.amazon_search_term.as_deref() else {
            return Ok(None);
        };
        let tag = perfume
            .affiliate
            .as_ref()
            .map(|a| a.tag.as_str())
            .unwrap_or(default_tag);

        let url = Url::parse_with_params(PURCHASE_BASE_URL, &[("k", term), ("tag", tag)])
            .map_err(|e| AppError::Internal(format!("Failed to build purchase link: {}", e)))?;
        Ok(Some(url.to_string()))
    }
}
