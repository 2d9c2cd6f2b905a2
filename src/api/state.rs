use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::{
    config::Config,
    db::{Cache, KeyValueStore, MemoryStore},
    error::AppResult,
    models::{Perfume, Wardrobe},
    services::{
        operation::OperationToken,
        providers::{CredentialStore, GenerativeModel},
        AiClient, Catalog, CatalogSeed, CommunityFeed, CounterPolicy, HttpImageProbe, ImageProbe,
        ImageResolver, Normalizer, RecentlyViewed, RecommendationService, SessionClipboard,
        ShareTarget, TrackedOperation,
    },
};

/// External collaborators the state is wired to
pub struct Collaborators {
    pub model: Arc<dyn GenerativeModel>,
    pub credentials: CredentialStore,
    pub cache: Cache,
    pub image_probe: Arc<dyn ImageProbe>,
    pub image_store: Arc<dyn KeyValueStore>,
    pub session_store: Arc<dyn KeyValueStore>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
    pub recommendations: RecommendationService,
    pub images: ImageResolver,
    pub credentials: CredentialStore,
    pub recently_viewed: RecentlyViewed,
    /// Mood, notes and vibe searches share one matchmaker panel
    pub matchmaker: TrackedOperation<Vec<Perfume>>,
    pub similar: TrackedOperation<Vec<Perfume>>,
    /// Servers have no share sheet; the session clipboard is the fallback
    pub native_share: Option<Arc<dyn ShareTarget>>,
    pub clipboard: Arc<SessionClipboard>,
    pub default_affiliate_tag: String,
    pub public_url: String,
}

/// Session state mutated by handlers under the write lock
pub struct AppStateInner {
    pub catalog: Catalog,
    pub wardrobe: Wardrobe,
    pub feed: CommunityFeed,
}

impl AppState {
    pub async fn new(config: &Config, collaborators: Collaborators) -> anyhow::Result<Self> {
        let seed = CatalogSeed::embedded()
            .map_err(|e| anyhow::anyhow!("Failed to load catalog seed: {}", e))?;
        let (catalog, posts) = Catalog::from_seed(seed);

        let policy = if config.synthesize_social_counters {
            CounterPolicy::Synthesize
        } else {
            CounterPolicy::Zero
        };
        let ai = AiClient::new(
            collaborators.model,
            config.text_model.clone(),
            config.image_model.clone(),
        );

        let recently_viewed = RecentlyViewed::load(collaborators.session_store).await;

        Ok(Self {
            inner: Arc::new(RwLock::new(AppStateInner {
                catalog,
                wardrobe: Wardrobe::new(),
                feed: CommunityFeed::new(posts),
            })),
            recommendations: RecommendationService::new(
                ai.clone(),
                collaborators.cache,
                Normalizer::new(policy),
            ),
            images: ImageResolver::new(collaborators.image_probe, collaborators.image_store, ai),
            credentials: collaborators.credentials,
            recently_viewed,
            matchmaker: TrackedOperation::new(),
            similar: TrackedOperation::new(),
            native_share: None,
            clipboard: Arc::new(SessionClipboard::new()),
            default_affiliate_tag: config.default_affiliate_tag.clone(),
            public_url: format!("http://{}:{}", config.host, config.port),
        })
    }

    /// State with in-process cache and stores around the given model
    pub async fn in_memory(
        config: &Config,
        model: Arc<dyn GenerativeModel>,
    ) -> anyhow::Result<Self> {
        let collaborators = Collaborators {
            model,
            credentials: CredentialStore::new(config.api_key.clone()),
            cache: Cache::in_memory(),
            image_probe: Arc::new(HttpImageProbe::new(Duration::from_secs(
                config.image_probe_timeout_secs,
            ))),
            image_store: Arc::new(MemoryStore::new()),
            session_store: Arc::new(MemoryStore::new()),
        };
        Self::new(config, collaborators).await
    }

    /// Clears the credential when the provider rejected it. No retry happens.
    pub fn check_credential<T>(&self, result: AppResult<T>) -> AppResult<T> {
        if let Err(e) = &result {
            if e.is_invalid_credential() {
                self.credentials.reset();
            }
        }
        result
    }

    /// Publishes a tracked result unless a newer run superseded it
    pub async fn finish(
        &self,
        operation: &TrackedOperation<Vec<Perfume>>,
        token: OperationToken,
        result: AppResult<Vec<Perfume>>,
    ) -> AppResult<Vec<Perfume>> {
        operation.complete(token, &result).await;
        self.check_credential(result)
    }
}
