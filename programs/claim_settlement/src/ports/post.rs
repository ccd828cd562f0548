use async_trait::async_trait;

use crate::error::PostError;

/// Public post as seen by the claim flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub reference: String,
    /// Author handle, with or without a leading `@`
    pub author_handle: String,
    pub text: String,
}

/// Resolves a post reference to its author and content
#[async_trait]
pub trait PostLookup: Send + Sync {
    async fn lookup(&self, post_reference: &str) -> Result<Post, PostError>;
}
