use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Post, SharePayload},
};

const POST_AUTHOR: &str = "You";

/// The session's community feed, newest first
#[derive(Debug, Default)]
pub struct CommunityFeed {
    posts: Vec<Post>,
}

impl CommunityFeed {
    pub fn new(seed: Vec<Post>) -> Self {
        Self { posts: seed }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn create_post(&mut self, content: &str) -> AppResult<Post> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "Please write something before posting.".to_string(),
            ));
        }

        let post = Post::new(POST_AUTHOR, content);
        self.posts.insert(0, post.clone());
        tracing::info!(post_id = %post.id, "Community post created");
        Ok(post)
    }

    pub fn find(&self, id: Uuid) -> AppResult<&Post> {
        self.posts
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("No post with id {}", id)))
    }

    pub fn share_payload(&self, id: Uuid, url: &str) -> AppResult<SharePayload> {
        Ok(SharePayload::for_post(self.find(id)?, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> CommunityFeed {
        CommunityFeed::new(vec![
            Post::new("ScentedSoul", "Midnight Oud is a game-changer."),
            Post::new("PerfumePixel", "Wedding florals?"),
        ])
    }

    #[test]
    fn test_new_post_goes_first() {
        let mut feed = feed();
        let post = feed.create_post("  Santal 33 all week.  ").unwrap();

        assert_eq!(post.author, "You");
        assert_eq!(post.content, "Santal 33 all week.");
        assert_eq!((post.likes, post.comments), (0, 0));
        assert_eq!(feed.posts()[0], post);
        assert_eq!(feed.posts().len(), 3);
    }

    #[test]
    fn test_blank_post_is_rejected() {
        let mut feed = feed();
        assert!(matches!(
            feed.create_post(" \n "),
            Err(AppError::Validation(_))
        ));
        assert_eq!(feed.posts().len(), 2);
    }

    #[test]
    fn test_share_payload_for_unknown_post() {
        assert!(matches!(
            feed().share_payload(Uuid::new_v4(), "http://localhost"),
            Err(AppError::NotFound(_))
        ));
    }
}
