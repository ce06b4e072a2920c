use serde::{Deserialize, Serialize};
use tagscope_common::Cutoff;

const POST_URL_PREFIX: &str = "https://www.instagram.com/p/";

/// Simplified post emitted by the extractor.
///
/// Empty/zero optional fields are left out of the JSON form; `text` is
/// always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Post {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner_username: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "comments", default, skip_serializing_if = "is_zero")]
    pub comment_count: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub post_url: String,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

/// The `{"posts": [...]}` document persisted and served to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostsDocument {
    pub posts: Vec<Post>,
}

/// Canonical permalink for a shortcode; empty when there is no code.
pub fn post_url(code: Option<&str>) -> String {
    match code {
        Some(code) if !code.is_empty() => format!("{POST_URL_PREFIX}{code}/"),
        _ => String::new(),
    }
}

/// The fields of one media record that feed the filter, borrowed from either
/// the typed envelope or an untyped JSON node.
#[derive(Debug, Clone, Copy)]
pub struct MediaRecord<'a> {
    pub created_at: i64,
    pub text: &'a str,
    pub username: &'a str,
    pub comment_count: u64,
    pub code: Option<&'a str>,
}

impl MediaRecord<'_> {
    /// Apply the recency filter and build the output record.
    pub fn into_post(self, cutoff: Cutoff) -> Option<Post> {
        if !cutoff.admits(self.created_at) {
            return None;
        }
        Some(Post {
            owner_username: self.username.to_string(),
            text: self.text.to_string(),
            comment_count: self.comment_count,
            post_url: post_url(self.code),
        })
    }
}
