use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{ImageInput, Perfume, RecommendationKind},
    services::{
        ai_client::{recommendation_schema, AiClient},
        normalizer::Normalizer,
        providers::Part,
    },
};

const SOMMELIER_BRIEF: &str = "act as an expert fragrance sommelier. Recommend 3 real-world, \
well-known perfumes. For each perfume, provide its name, brand, a poetic one-sentence \
description, and three separate lists for its key top, middle, and base notes. Also include \
a rating from 1 to 5 for both longevity and sillage.";

const VIBE_BRIEF: &str = "Based on the vibe and atmosphere of this image, act as an expert \
fragrance sommelier. Recommend 3 real-world, well-known perfumes that match the mood. For each \
perfume, provide its name, brand, a poetic one-sentence description, and three separate lists \
for its key top, middle, and base notes. Also include a rating from 1 to 5 for both longevity \
and sillage.";

pub fn mood_prompt(text: &str) -> String {
    format!(
        "Based on the following user input: \"{}\", {}",
        text, SOMMELIER_BRIEF
    )
}

pub fn notes_prompt(notes: &[String]) -> String {
    mood_prompt(&format!(
        "A fragrance featuring the notes: {}.",
        notes.join(", ")
    ))
}

pub fn similar_prompt(perfume: &Perfume) -> String {
    let all_notes: Vec<&str> = perfume.all_notes().map(String::as_str).collect();
    format!(
        "Given the perfume \"{}\" by \"{}\" with key notes like {}, recommend 3 other \
         real-world, well-known perfumes that have a similar scent profile or vibe. For each \
         recommendation, provide its name, brand, a poetic one-sentence description, and three \
         separate lists for its key top, middle, and base notes. Also include a rating from 1 to \
         5 for both longevity and sillage. Do not recommend the original perfume itself.",
        perfume.name,
        perfume.brand,
        all_notes.join(", ")
    )
}

pub fn enhance_prompt(text: &str) -> String {
    format!(
        "Rewrite the following user post about perfume to be more poetic, descriptive, and \
         engaging, in the style of a fragrance expert. Keep the core meaning intact. \
         User post: \"{}\"",
        text
    )
}

/// Distinct, trimmed, non-blank notes in selection order
fn distinct_notes(notes: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for note in notes.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        if !out.iter().any(|seen| seen == note) {
            out.push(note.to_string());
        }
    }
    out
}

/// Entry points behind the matchmaker, the detail view and the community composer
///
/// Each operation is cache lookup, then on a miss one adapter call, normalization
/// and a cache write, strictly in that order. Input validation happens before
/// any of it, so rejected input never reaches the provider. The miss branch runs
/// on its own task: a caller that goes away does not abort the call, and its
/// result is still cached.
#[derive(Clone)]
pub struct RecommendationService {
    ai: AiClient,
    cache: Cache,
    normalizer: Normalizer,
}

impl RecommendationService {
    pub fn new(ai: AiClient, cache: Cache, normalizer: Normalizer) -> Self {
        Self {
            ai,
            cache,
            normalizer,
        }
    }

    pub async fn recommend_by_mood(&self, text: &str) -> AppResult<Vec<Perfume>> {
        if text.trim().is_empty() {
            return Err(AppError::Validation(
                "Please describe your mood or desired scent.".to_string(),
            ));
        }
        self.recommend_from_prompt(RecommendationKind::Mood, mood_prompt(text))
            .await
    }

    pub async fn recommend_by_notes(&self, notes: &[String]) -> AppResult<Vec<Perfume>> {
        let notes = distinct_notes(notes);
        if notes.is_empty() {
            return Err(AppError::Validation(
                "Please select at least one scent note.".to_string(),
            ));
        }
        self.recommend_from_prompt(RecommendationKind::Notes, notes_prompt(&notes))
            .await
    }

    pub async fn recommend_by_vibe(&self, image: &ImageInput) -> AppResult<Vec<Perfume>> {
        if image.is_empty() {
            return Err(AppError::Validation(
                "Please upload a photo to match its vibe.".to_string(),
            ));
        }

        let parts = vec![
            Part::InlineData {
                mime_type: image.mime_type.clone(),
                data: image.bytes.clone(),
            },
            Part::Text(VIBE_BRIEF.to_string()),
        ];
        let service = self.clone();
        cached!(self.cache, CacheKey::Vibe(image.fingerprint()), async move {
            service.fetch(RecommendationKind::Vibe, parts).await
        })
    }

    /// The prompt asks the model to leave `perfume` out; results are not re-checked.
    pub async fn recommend_similar(&self, perfume: &Perfume) -> AppResult<Vec<Perfume>> {
        let key = CacheKey::Similar {
            brand: perfume.brand.clone(),
            name: perfume.name.clone(),
        };
        let parts = vec![Part::Text(similar_prompt(perfume))];
        let service = self.clone();
        cached!(self.cache, key, async move {
            service.fetch(RecommendationKind::Similar, parts).await
        })
    }

    /// Rewrites a community post. Blank input comes back as an empty string.
    pub async fn enhance_text(&self, text: &str) -> AppResult<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let ai = self.ai.clone();
        let prompt = enhance_prompt(text);
        cached!(self.cache, CacheKey::Enhance(text.to_string()), async move {
            let enhanced = ai.generate_text(&prompt).await?;
            tracing::info!(kind = %RecommendationKind::Enhance, "Post enhanced");
            Ok::<_, AppError>(enhanced)
        })
    }

    async fn recommend_from_prompt(
        &self,
        kind: RecommendationKind,
        prompt: String,
    ) -> AppResult<Vec<Perfume>> {
        let service = self.clone();
        let parts = vec![Part::Text(prompt.clone())];
        cached!(self.cache, CacheKey::Prompt(prompt), async move {
            service.fetch(kind, parts).await
        })
    }

    async fn fetch(&self, kind: RecommendationKind, parts: Vec<Part>) -> AppResult<Vec<Perfume>> {
        let payload = self
            .ai
            .generate_structured(parts, recommendation_schema())
            .await?;
        let perfumes = self.normalizer.normalize(payload)?;

        tracing::info!(
            kind = %kind,
            results = perfumes.len(),
            "Recommendations fetched"
        );

        Ok(perfumes)
    }
}
