use rand::Rng;
use serde::Deserialize;
use serde_json::Value;

use crate::{error::AiRequestError, models::Perfume};

/// How AI-sourced items get their like/dislike counters when the model sends none
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterPolicy {
    /// Demo numbers: likes in [50, 550), dislikes in [5, 55). Not telemetry.
    Synthesize,
    Zero,
}

/// The two shapes a recommendation payload may take
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationEnvelope {
    /// `{ "recommendations": [...] }`
    Wrapped(Vec<Value>),
    /// `[...]`
    Bare(Vec<Value>),
}

impl RecommendationEnvelope {
    pub fn into_items(self) -> Vec<Value> {
        match self {
            RecommendationEnvelope::Wrapped(items) | RecommendationEnvelope::Bare(items) => items,
        }
    }
}

impl TryFrom<Value> for RecommendationEnvelope {
    type Error = AiRequestError;

    fn try_from(payload: Value) -> Result<Self, Self::Error> {
        match payload {
            Value::Array(items) => Ok(RecommendationEnvelope::Bare(items)),
            Value::Object(mut map) => match map.remove("recommendations") {
                Some(Value::Array(items)) => Ok(RecommendationEnvelope::Wrapped(items)),
                Some(_) => Err(AiRequestError::MalformedResponse(
                    "'recommendations' is not an array".to_string(),
                )),
                None => Err(AiRequestError::MalformedResponse(
                    "response has no recommendations array".to_string(),
                )),
            },
            other => Err(AiRequestError::MalformedResponse(format!(
                "expected an array or an object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A recommendation exactly as the model returns it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecommendation {
    name: String,
    brand: String,
    description: String,
    top_notes: Vec<String>,
    middle_notes: Vec<String>,
    base_notes: Vec<String>,
    longevity: f64,
    sillage: f64,
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    likes: Option<u32>,
    #[serde(default)]
    dislikes: Option<u32>,
}

fn bounded_rating(value: f64) -> u8 {
    if value.is_finite() {
        value.round().clamp(1.0, 5.0) as u8
    } else {
        1
    }
}

/// Turns model output into catalog-shaped perfumes
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    policy: CounterPolicy,
}

impl Normalizer {
    pub fn new(policy: CounterPolicy) -> Self {
        Self { policy }
    }

    /// Decodes either envelope shape and normalizes every item.
    /// Note lists pass through in model order.
    pub fn normalize(&self, payload: Value) -> Result<Vec<Perfume>, AiRequestError> {
        let items = RecommendationEnvelope::try_from(payload)?.into_items();

        let mut rng = rand::thread_rng();
        items
            .into_iter()
            .map(|item| {
                let raw: RawRecommendation = serde_json::from_value(item).map_err(|e| {
                    AiRequestError::MalformedResponse(format!("invalid recommendation: {}", e))
                })?;

                let (likes, dislikes) = match (raw.likes, raw.dislikes, self.policy) {
                    (Some(likes), Some(dislikes), _) => (likes, dislikes),
                    (_, _, CounterPolicy::Synthesize) => {
                        (rng.gen_range(50..550), rng.gen_range(5..55))
                    }
                    (_, _, CounterPolicy::Zero) => (0, 0),
                };

                Ok(Perfume {
                    name: raw.name,
                    brand: raw.brand,
                    description: raw.description,
                    top_notes: raw.top_notes,
                    middle_notes: raw.middle_notes,
                    base_notes: raw.base_notes,
                    image_url: raw.image_url,
                    family: raw.family,
                    longevity: bounded_rating(raw.longevity),
                    sillage: bounded_rating(raw.sillage),
                    likes,
                    dislikes,
                    reviews: Vec::new(),
                    is_verified: None,
                    amazon_search_term: None,
                    affiliate: None,
                    clones: Vec::new(),
                })
            })
            .collect()
    }
}
