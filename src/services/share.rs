use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::SharePayload,
};

/// A platform share sheet
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ShareTarget: Send + Sync {
    async fn share(&self, payload: &SharePayload) -> Result<(), String>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), String>;
}

/// Holds the last text copied during this session
#[derive(Debug, Default)]
pub struct SessionClipboard {
    contents: RwLock<Option<String>>,
}

impl SessionClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contents(&self) -> Option<String> {
        self.contents.read().await.clone()
    }
}

#[async_trait::async_trait]
impl Clipboard for SessionClipboard {
    async fn write_text(&self, text: &str) -> Result<(), String> {
        *self.contents.write().await = Some(text.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareOutcome {
    Shared,
    /// The share sheet was dismissed or failed; nothing else is tried
    Cancelled,
    Copied,
}

/// Native share when there is one, otherwise the clipboard
pub async fn share_with_fallback(
    payload: &SharePayload,
    native: Option<&dyn ShareTarget>,
    clipboard: &dyn Clipboard,
) -> AppResult<ShareOutcome> {
    if let Some(native) = native {
        return match native.share(payload).await {
            Ok(()) => Ok(ShareOutcome::Shared),
            Err(e) => {
                tracing::warn!(error = %e, "Share sheet did not complete");
                Ok(ShareOutcome::Cancelled)
            }
        };
    }

    match clipboard.write_text(&payload.clipboard_text()).await {
        Ok(()) => Ok(ShareOutcome::Copied),
        Err(e) => {
            tracing::error!(error = %e, "Failed to copy to clipboard");
            Err(AppError::ShareUnavailable(e))
        }
    }
}
