use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client as HttpClient;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    db::KeyValueStore,
    error::AiRequestError,
    models::{Perfume, PerfumeKey},
    services::ai_client::AiClient,
};

/// How many notes the bottle prompt mentions
const PROMPT_NOTE_LIMIT: usize = 5;

/// Checks whether an authoritative image URL actually loads
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ImageProbe: Send + Sync {
    async fn is_reachable(&self, url: &str) -> bool;
}

/// Plain GET; any transport error or non-success status counts as unreachable
#[derive(Clone)]
pub struct HttpImageProbe {
    http_client: HttpClient,
}

impl HttpImageProbe {
    pub fn new(timeout: Duration) -> Self {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| HttpClient::new());
        Self { http_client }
    }
}

#[async_trait::async_trait]
impl ImageProbe for HttpImageProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        match self.http_client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Image probe failed");
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Authoritative,
    Cached,
    Generated,
    /// Nothing could be loaded; render the logo glyph
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedImage {
    pub source: ImageSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ResolvedImage {
    fn found(source: ImageSource, url: String) -> Self {
        Self {
            source,
            url: Some(url),
        }
    }

    fn placeholder() -> Self {
        Self {
            source: ImageSource::Placeholder,
            url: None,
        }
    }
}

pub fn image_store_key(perfume: &Perfume) -> String {
    format!("fragrance_image_{}_{}", perfume.brand, perfume.name)
}

pub fn bottle_prompt(perfume: &Perfume) -> String {
    let notes: Vec<&str> = perfume
        .all_notes()
        .take(PROMPT_NOTE_LIMIT)
        .map(String::as_str)
        .collect();
    format!(
        "A professional, photorealistic product shot of a perfume bottle for \"{}\" by {}. \
         The style is elegant, luxurious, and minimalist. The bottle is the central focus, \
         appearing chic and appealing. The background is clean and soft-focus, subtly evoking \
         its key notes of {}. The lighting is bright and airy.",
        perfume.name,
        perfume.brand,
        notes.join(", ")
    )
}

/// Picks the artwork for one catalog item
///
/// Authoritative URL, then a previously generated image from the store, then a
/// fresh generation, then the placeholder. Each step runs at most once per call.
#[derive(Clone)]
pub struct ImageResolver {
    probe: Arc<dyn ImageProbe>,
    store: Arc<dyn KeyValueStore>,
    ai: AiClient,
}

impl ImageResolver {
    pub fn new(probe: Arc<dyn ImageProbe>, store: Arc<dyn KeyValueStore>, ai: AiClient) -> Self {
        Self { probe, store, ai }
    }

    /// Only an invalid credential escapes as an error, so the caller can reset it.
    /// Every other failure ends at the placeholder.
    pub async fn resolve(&self, perfume: &Perfume) -> Result<ResolvedImage, AiRequestError> {
        if let Some(url) = perfume.image_url.as_deref().filter(|u| !u.trim().is_empty()) {
            if self.probe.is_reachable(url).await {
                return Ok(ResolvedImage::found(
                    ImageSource::Authoritative,
                    url.to_string(),
                ));
            }
            tracing::warn!(
                perfume = %perfume.key(),
                "Official image failed to load, falling back to generated artwork"
            );
        }

        let key = image_store_key(perfume);
        match self.store.get(&key).await {
            Ok(Some(data_url)) => return Ok(ResolvedImage::found(ImageSource::Cached, data_url)),
            Ok(None) => {}
            Err(e) => tracing::error!(key = %key, error = %e, "Image store read failed"),
        }

        let resolver = self.clone();
        let prompt = bottle_prompt(perfume);
        let perfume_key = perfume.key();
        let task = tokio::spawn(async move {
            resolver.generate_and_store(key, prompt, perfume_key).await
        });
        match task.await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::error!(error = %e, "Image generation task failed");
                Ok(ResolvedImage::placeholder())
            }
        }
    }

    /// Runs detached from the request so an abandoned view still stores its artwork
    async fn generate_and_store(
        &self,
        key: String,
        prompt: String,
        perfume_key: PerfumeKey,
    ) -> Result<ResolvedImage, AiRequestError> {
        match self.ai.generate_image(&prompt).await {
            Ok(image) => {
                let data_url = format!(
                    "data:{};base64,{}",
                    image.mime_type,
                    BASE64.encode(&image.data)
                );
                if let Err(e) = self.store.put(&key, &data_url).await {
                    tracing::error!(key = %key, error = %e, "Image store write failed");
                }
                tracing::info!(perfume = %perfume_key, "Bottle image generated");
                Ok(ResolvedImage::found(ImageSource::Generated, data_url))
            }
            Err(e) if e.is_invalid_credential() => Err(e),
            Err(e) => {
                tracing::error!(perfume = %perfume_key, error = %e, "Image generation failed");
                Ok(ResolvedImage::placeholder())
            }
        }
    }
}
