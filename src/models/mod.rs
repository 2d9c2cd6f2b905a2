mod community;
mod perfume;
mod rating;
mod recommendation;
mod wardrobe;

pub use community::{Post, SharePayload};
pub use perfume::{Affiliate, ClonePerfume, Perfume, PerfumeKey, Review, ScentFamily};
pub use rating::{apply_action, next_action, SocialCounters, UserAction};
pub use recommendation::{ImageInput, RecommendationKind};
pub use wardrobe::{Shelf, Wardrobe};

#[cfg(test)]
pub(crate) use perfume::fixtures;
