use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A community feed post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub comments: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author: author.into(),
            content: content.into(),
            likes: 0,
            comments: 0,
            posted_at: Some(Utc::now()),
        }
    }
}

/// What gets handed to a share target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    pub fn for_post(post: &Post, url: impl Into<String>) -> Self {
        Self {
            title: format!("A post by {} on FragranceVerse", post.author),
            text: post.content.clone(),
            url: url.into(),
        }
    }

    /// Text copied to the clipboard when no native share is available
    pub fn clipboard_text(&self) -> String {
        format!("{}\n\n\"{}\"", self.title, self.text)
    }
}
