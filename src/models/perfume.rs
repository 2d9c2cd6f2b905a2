use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::SocialCounters;

/// Identity of a catalog item: the (brand, name) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerfumeKey {
    pub brand: String,
    pub name: String,
}

impl PerfumeKey {
    pub fn new(brand: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            name: name.into(),
        }
    }
}

impl Display for PerfumeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} by {}", self.name, self.brand)
    }
}

/// A single user review. Never edited after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub author: String,
    /// 1 to 5
    pub rating: u8,
    pub comment: String,
    pub date: NaiveDate,
}

/// A cheaper fragrance the community says smells alike
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClonePerfume {
    pub name: String,
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Affiliate {
    pub provider: String,
    pub tag: String,
}

/// A perfume, either from the static catalog or sourced from the AI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Perfume {
    pub name: String,
    pub brand: String,
    pub description: String,
    /// Note lists keep presentation order; they are never sorted
    pub top_notes: Vec<String>,
    pub middle_notes: Vec<String>,
    pub base_notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    /// 1 to 5
    pub longevity: u8,
    /// 1 to 5
    pub sillage: u8,
    pub likes: u32,
    pub dislikes: u32,
    /// Most recent first
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amazon_search_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate: Option<Affiliate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clones: Vec<ClonePerfume>,
}

impl Perfume {
    pub fn key(&self) -> PerfumeKey {
        PerfumeKey::new(self.brand.clone(), self.name.clone())
    }

    pub fn is(&self, key: &PerfumeKey) -> bool {
        self.brand == key.brand && self.name == key.name
    }

    /// Top, middle then base notes
    pub fn all_notes(&self) -> impl Iterator<Item = &String> {
        self.top_notes
            .iter()
            .chain(self.middle_notes.iter())
            .chain(self.base_notes.iter())
    }

    /// Case-insensitive substring match on name, brand and every note.
    /// `term` must already be lowercase.
    pub fn matches(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(term)
            || self.brand.to_lowercase().contains(term)
            || self.all_notes().any(|note| note.to_lowercase().contains(term))
    }

    pub fn counters(&self) -> SocialCounters {
        SocialCounters {
            likes: self.likes,
            dislikes: self.dislikes,
        }
    }

    pub fn set_counters(&mut self, counters: SocialCounters) {
        self.likes = counters.likes;
        self.dislikes = counters.dislikes;
    }
}

/// A scent family with the catalog items tagged with it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScentFamily {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub perfumes: Vec<Perfume>,
}
