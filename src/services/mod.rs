pub mod ai_client;
pub mod catalog;
pub mod community;
pub mod images;
pub mod normalizer;
pub mod operation;
pub mod providers;
pub mod recently_viewed;
pub mod recommendations;
pub mod share;

pub use ai_client::AiClient;
pub use catalog::{Catalog, CatalogSeed, RatingOutcome};
pub use community::CommunityFeed;
pub use images::{HttpImageProbe, ImageProbe, ImageResolver, ImageSource, ResolvedImage};
pub use normalizer::{CounterPolicy, Normalizer};
pub use operation::{OperationState, TrackedOperation};
pub use recently_viewed::RecentlyViewed;
pub use recommendations::RecommendationService;
pub use share::{share_with_fallback, Clipboard, SessionClipboard, ShareOutcome, ShareTarget};
