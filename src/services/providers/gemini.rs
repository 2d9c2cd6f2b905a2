/// Google Gemini provider
///
/// Talks to the `generateContent` REST endpoint:
/// `POST {api_url}/models/{model}:generateContent` with the key in `x-goog-api-key`.
/// Structured calls set `responseMimeType: application/json` plus a `responseSchema`;
/// image calls ask for the `IMAGE` response modality and read `inlineData` parts back.
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client as HttpClient;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::{
    CredentialStore, GenerateRequest, GenerateResponse, GenerativeModel, InlineImage,
    OutputModality, Part, ProviderError,
};

const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: HttpClient,
    api_url: String,
    credentials: CredentialStore,
}

impl GeminiProvider {
    pub fn new(api_url: &str, credentials: CredentialStore, timeout: Duration) -> Self {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| HttpClient::new());

        Self {
            http_client,
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{}", trimmed)
        };
        format!("{}/{}:generateContent", self.api_url, model_path)
    }

    fn build_payload(request: &GenerateRequest) -> Value {
        let parts: Vec<Value> = request
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => json!({ "text": text }),
                Part::InlineData { mime_type, data } => json!({
                    "inlineData": {
                        "mimeType": mime_type,
                        "data": BASE64.encode(data),
                    }
                }),
            })
            .collect();

        let mut generation_config = Map::new();
        match request.modality {
            OutputModality::Text => {}
            OutputModality::Json => {
                generation_config.insert(
                    "responseMimeType".to_string(),
                    Value::String("application/json".to_string()),
                );
                if let Some(schema) = &request.response_schema {
                    generation_config.insert("responseSchema".to_string(), schema.clone());
                }
            }
            OutputModality::Image => {
                generation_config.insert("responseModalities".to_string(), json!(["IMAGE"]));
            }
        }

        let mut payload = Map::new();
        payload.insert("contents".to_string(), json!([{ "parts": parts }]));
        if !generation_config.is_empty() {
            payload.insert(
                "generationConfig".to_string(),
                Value::Object(generation_config),
            );
        }
        Value::Object(payload)
    }

    /// Pulls the human-readable message out of a Gemini error body
    fn error_message(body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY_CHARS).collect())
    }

    fn parse_response(payload: &Value) -> Result<GenerateResponse, ProviderError> {
        let candidates = payload
            .get("candidates")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        if candidates.is_empty() {
            if let Some(reason) = payload
                .get("promptFeedback")
                .and_then(|f| f.get("blockReason"))
                .and_then(Value::as_str)
            {
                return Err(ProviderError::Rejected {
                    status: 200,
                    message: format!("Prompt blocked: {}", reason),
                });
            }
            return Err(ProviderError::Decode(
                "response contained no candidates".to_string(),
            ));
        }

        let parts = candidates[0]
            .get("content")
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut text = String::new();
        let mut images = Vec::new();
        for part in parts {
            if let Some(t) = part.get("text").and_then(Value::as_str) {
                text.push_str(t);
            }
            let Some(inline) = part.get("inlineData").or_else(|| part.get("inline_data")) else {
                continue;
            };
            let data = inline
                .get("data")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if data.is_empty() {
                continue;
            }
            let bytes = BASE64
                .decode(data.as_bytes())
                .map_err(|e| ProviderError::Decode(format!("image base64 decode failed: {}", e)))?;
            let mime_type = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .unwrap_or("image/png")
                .to_string();
            images.push(InlineImage {
                mime_type,
                data: bytes,
            });
        }

        Ok(GenerateResponse {
            text: (!text.is_empty()).then_some(text),
            images,
        })
    }
}

#[async_trait::async_trait]
impl GenerativeModel for GeminiProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        let api_key = self
            .credentials
            .get()
            .ok_or(ProviderError::MissingCredential)?;

        let endpoint = self.endpoint_for_model(&request.model);
        let payload = Self::build_payload(&request);

        tracing::debug!(model = %request.model, modality = ?request.modality, "Calling Gemini");

        let response = self
            .http_client
            .post(&endpoint)
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::error!(
                model = %request.model,
                status = %status,
                "Gemini request failed"
            );
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message: Self::error_message(&body),
            });
        }

        let parsed: Value = serde_json::from_str(&body).map_err(|e| {
            ProviderError::Decode(format!("Gemini returned invalid JSON payload: {}", e))
        })?;

        Self::parse_response(&parsed)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(
            "https://example.test/v1beta/",
            CredentialStore::new(Some("test_key".to_string())),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_endpoint_for_model() {
        let p = provider();
        assert_eq!(
            p.endpoint_for_model("gemini-2.5-flash"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            p.endpoint_for_model("models/gemini-2.5-flash-image"),
            "https://example.test/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn test_json_payload_carries_schema() {
        let request = GenerateRequest {
            model: "gemini-2.5-flash".to_string(),
            parts: vec![Part::Text("hello".to_string())],
            response_schema: Some(json!({ "type": "OBJECT" })),
            modality: OutputModality::Json,
        };
        let payload = GeminiProvider::build_payload(&request);
        assert_eq!(payload["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(
            payload["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(payload["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_inline_data_is_base64_encoded() {
        let request = GenerateRequest {
            model: "gemini-2.5-flash".to_string(),
            parts: vec![
                Part::InlineData {
                    mime_type: "image/jpeg".to_string(),
                    data: b"hello".to_vec(),
                },
                Part::Text("vibe".to_string()),
            ],
            response_schema: None,
            modality: OutputModality::Json,
        };
        let payload = GeminiProvider::build_payload(&request);
        let inline = &payload["contents"][0]["parts"][0]["inlineData"];
        assert_eq!(inline["mimeType"], "image/jpeg");
        assert_eq!(inline["data"], "aGVsbG8=");
    }

    #[test]
    fn test_text_payload_has_no_generation_config() {
        let request = GenerateRequest {
            model: "gemini-2.5-flash".to_string(),
            parts: vec![Part::Text("rewrite".to_string())],
            response_schema: None,
            modality: OutputModality::Text,
        };
        let payload = GeminiProvider::build_payload(&request);
        assert!(payload.get("generationConfig").is_none());
    }

    #[test]
    fn test_image_payload_requests_image_modality() {
        let request = GenerateRequest {
            model: "gemini-2.5-flash-image".to_string(),
            parts: vec![Part::Text("bottle".to_string())],
            response_schema: None,
            modality: OutputModality::Image,
        };
        let payload = GeminiProvider::build_payload(&request);
        assert_eq!(
            payload["generationConfig"]["responseModalities"],
            json!(["IMAGE"])
        );
    }

    #[test]
    fn test_parse_text_response() {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "[{\"name\":" }, { "text": "\"x\"}]" }] }
            }]
        });
        let response = GeminiProvider::parse_response(&payload).unwrap();
        assert_eq!(response.text.as_deref(), Some("[{\"name\":\"x\"}]"));
        assert!(response.images.is_empty());
    }

    #[test]
    fn test_parse_image_response() {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "aGVsbG8=" } }] }
            }]
        });
        let response = GeminiProvider::parse_response(&payload).unwrap();
        assert_eq!(response.text, None);
        assert_eq!(response.images[0].data, b"hello".to_vec());
        assert_eq!(response.images[0].mime_type, "image/png");
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let payload = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert_eq!(
            GeminiProvider::parse_response(&payload),
            Err(ProviderError::Rejected {
                status: 200,
                message: "Prompt blocked: SAFETY".to_string()
            })
        );
    }

    #[test]
    fn test_parse_empty_candidates_is_decode_error() {
        assert!(matches!(
            GeminiProvider::parse_response(&json!({})),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            GeminiProvider::error_message(body),
            "API key not valid. Please pass a valid API key."
        );
        assert_eq!(GeminiProvider::error_message("plain failure"), "plain failure");
    }

    #[tokio::test]
    async fn test_missing_credential_short_circuits() {
        let provider = GeminiProvider::new(
            "http://127.0.0.1:1",
            CredentialStore::new(None),
            Duration::from_secs(1),
        );
        let request = GenerateRequest {
            model: "gemini-2.5-flash".to_string(),
            parts: vec![Part::Text("hi".to_string())],
            response_schema: None,
            modality: OutputModality::Text,
        };
        assert_eq!(
            provider.generate(request).await,
            Err(ProviderError::MissingCredential)
        );
    }
}
