use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MessageId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEmail {
    pub id: MessageId,
    pub sender: String,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub thread_id: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl RawEmail {
    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLinkedInPost {
    pub id: MessageId,
    pub text: String,
    pub url: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub top_comments: Vec<String>,
    #[serde(default)]
    pub tagged_entities: Vec<String>,
    pub author: String,
    pub posted_at: DateTime<Utc>,
    #[serde(default)]
    pub is_repost: bool,
    /// The original post's payload when `is_repost` is true and the
    /// fetcher captured it.
    #[serde(default)]
    pub original: Option<Box<RawLinkedInPost>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawMessage {
    Email(RawEmail),
    LinkedInPost(RawLinkedInPost),
}

impl RawMessage {
    pub fn id(&self) -> &MessageId {
        match self {
            RawMessage::Email(email) => &email.id,
            RawMessage::LinkedInPost(post) => &post.id,
        }
    }

    pub fn as_email(&self) -> Option<&RawEmail> {
        match self {
            RawMessage::Email(email) => Some(email),
            RawMessage::LinkedInPost(_) => None,
        }
    }

    pub fn as_linkedin_post(&self) -> Option<&RawLinkedInPost> {
        match self {
            RawMessage::LinkedInPost(post) => Some(post),
            RawMessage::Email(_) => None,
        }
    }
}
