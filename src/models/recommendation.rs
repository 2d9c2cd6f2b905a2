use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Which orchestrator entry point produced a request, for logs
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Mood,
    Notes,
    Vibe,
    Similar,
    Enhance,
}

impl std::fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecommendationKind::Mood => "mood",
            RecommendationKind::Notes => "notes",
            RecommendationKind::Vibe => "vibe",
            RecommendationKind::Similar => "similar",
            RecommendationKind::Enhance => "enhance",
        };
        f.write_str(name)
    }
}

/// An uploaded photo for vibe matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn from_base64(data: &str, mime_type: &str) -> Result<Self, String> {
        let mime_type = mime_type.trim();
        if mime_type.is_empty() {
            return Err("Could not determine MIME type of the image".to_string());
        }
        let bytes = BASE64
            .decode(data.trim().as_bytes())
            .map_err(|e| format!("Image data is not valid base64: {}", e))?;
        Ok(Self {
            bytes,
            mime_type: mime_type.to_string(),
        })
    }

    /// Parses `data:<mime>;base64,<payload>`
    pub fn from_data_url(url: &str) -> Result<Self, String> {
        let parts: Vec<&str> = url.split(',').collect();
        if parts.len() != 2 {
            return Err("Invalid data URL format".to_string());
        }
        let mime_type = parts[0]
            .split(':')
            .nth(1)
            .and_then(|rest| rest.split(';').next())
            .filter(|mime| !mime.is_empty())
            .ok_or_else(|| "Could not determine MIME type from data URL".to_string())?;
        Self::from_base64(parts[1], mime_type)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Content fingerprint used as the response-cache key
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.mime_type.as_bytes());
        hasher.update([0u8]);
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())
    }
}
