use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::AiRequestError,
    services::providers::{
        classify, GenerateRequest, GenerativeModel, InlineImage, OutputModality, Part,
    },
};

/// Output schema for every recommendation call. All fields are required, so the
/// provider fails the call rather than return a partial perfume.
pub fn recommendation_schema() -> Value {
    let notes = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "recommendations": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "brand": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "topNotes": notes,
                        "middleNotes": notes,
                        "baseNotes": notes,
                        "longevity": { "type": "NUMBER" },
                        "sillage": { "type": "NUMBER" },
                    },
                    "required": [
                        "name", "brand", "description", "topNotes",
                        "middleNotes", "baseNotes", "longevity", "sillage"
                    ],
                },
            },
        },
        "required": ["recommendations"],
    })
}

/// Adapter over a [`GenerativeModel`]
///
/// One call, one request/response cycle. Does not cache and holds no shared
/// state beyond the provider handle. Every failure goes through [`classify`].
#[derive(Clone)]
pub struct AiClient {
    model: Arc<dyn GenerativeModel>,
    text_model: String,
    image_model: String,
}

impl AiClient {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        text_model: impl Into<String>,
        image_model: impl Into<String>,
    ) -> Self {
        Self {
            model,
            text_model: text_model.into(),
            image_model: image_model.into(),
        }
    }

    /// Schema-constrained call; returns the parsed JSON payload
    pub async fn generate_structured(
        &self,
        parts: Vec<Part>,
        schema: Value,
    ) -> Result<Value, AiRequestError> {
        let request = GenerateRequest {
            model: self.text_model.clone(),
            parts,
            response_schema: Some(schema),
            modality: OutputModality::Json,
        };

        let response = self.model.generate(request).await.map_err(classify)?;
        let text = response.text.ok_or_else(|| {
            AiRequestError::MalformedResponse("response contained no text".to_string())
        })?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                provider = self.model.name(),
                "Structured response is not JSON"
            );
            AiRequestError::MalformedResponse(format!("response is not valid JSON: {}", e))
        })
    }

    /// Plain-text call without a schema
    pub async fn generate_text(&self, prompt: &str) -> Result<String, AiRequestError> {
        let request = GenerateRequest {
            model: self.text_model.clone(),
            parts: vec![Part::Text(prompt.to_string())],
            response_schema: None,
            modality: OutputModality::Text,
        };

        let response = self.model.generate(request).await.map_err(classify)?;
        response.text.ok_or_else(|| {
            AiRequestError::MalformedResponse("response contained no text".to_string())
        })
    }

    pub async fn generate_image(&self, prompt: &str) -> Result<InlineImage, AiRequestError> {
        let request = GenerateRequest {
            model: self.image_model.clone(),
            parts: vec![Part::Text(prompt.to_string())],
            response_schema: None,
            modality: OutputModality::Image,
        };

        let response = self.model.generate(request).await.map_err(classify)?;
        response.images.into_iter().next().ok_or_else(|| {
            AiRequestError::MalformedResponse("No image data found in the AI response.".to_string())
        })
    }
}
