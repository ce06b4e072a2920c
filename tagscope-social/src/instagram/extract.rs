//! Turn a raw tag-feed document into filtered [`Post`] records.
//!
//! Extraction runs an ordered list of [`ExtractStrategy`]s and keeps the
//! first one that recognises the document. The default list tries the typed
//! [`EnvelopeStrategy`] and falls back to [`TreeWalkStrategy`], which scans the
//! whole JSON tree for media-shaped objects. Only invalid JSON is an error.
use serde::Deserialize;
use serde_json::Value;
use tagscope_common::Cutoff;

use crate::instagram::post::{MediaRecord, Post};
use crate::instagram::types::{Section, TagWebInfo};
use crate::instagram::value::ValueExt;

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("invalid JSON document: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("no extraction strategy recognised the document")]
    Unrecognised,
}

/// One way of locating media records in a parsed document.
pub trait ExtractStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when the document does not have the shape this strategy
    /// understands; `Some` (possibly empty) otherwise.
    fn extract(&self, doc: &Value, cutoff: Cutoff) -> Option<Vec<Post>>;
}

/// Walks `data.top.sections[].layout_content.{fill_items|medias}[].media`.
///
/// Output follows section order, then item order within a section.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeStrategy;

impl ExtractStrategy for EnvelopeStrategy {
    fn name(&self) -> &'static str {
        "envelope"
    }

    fn extract(&self, doc: &Value, cutoff: Cutoff) -> Option<Vec<Post>> {
        let envelope = match TagWebInfo::deserialize(doc) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "extract.envelope.mismatch: tag feed layout changed, falling back to tree walk"
                );
                return None;
            }
        };

        let feed = &envelope.data.top;
        tracing::debug!(
            status = ?envelope.status,
            tag = ?envelope.data.name,
            media_count = ?envelope.data.media_count,
            more_available = ?feed.more_available,
            next_max_id = ?feed.next_max_id,
            next_page = ?feed.next_page,
            count = ?envelope.count,
            sections = feed.sections.len(),
            "extract.envelope.matched"
        );

        let posts = feed
            .sections
            .iter()
            .flat_map(Section::items)
            .filter_map(|item| item.media.as_ref()?.record())
            .filter_map(|record| record.into_post(cutoff))
            .collect();
        Some(posts)
    }
}

/// Pre-order depth-first scan for any object whose `media.caption` carries a
/// string `text` and a numeric `created_at`.
///
/// Object members are visited in sorted key order, so output is
/// deterministic. A matching object is still descended into, so a
/// media-shaped object nested inside another one yields two posts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeWalkStrategy;

impl TreeWalkStrategy {
    fn walk(node: &Value, cutoff: Cutoff, out: &mut Vec<Post>) {
        match node {
            Value::Object(members) => {
                if let Some(post) = media_candidate(node).and_then(|r| r.into_post(cutoff)) {
                    out.push(post);
                }
                // Pinned explicitly: `preserve_order` on serde_json would
                // otherwise switch the map to insertion order.
                let mut children: Vec<_> = members.iter().collect();
                children.sort_unstable_by(|a, b| a.0.cmp(b.0));
                for (_, child) in children {
                    Self::walk(child, cutoff, out);
                }
            }
            Value::Array(items) => {
                for child in items {
                    Self::walk(child, cutoff, out);
                }
            }
            _ => {}
        }
    }
}

impl ExtractStrategy for TreeWalkStrategy {
    fn name(&self) -> &'static str {
        "tree-walk"
    }

    fn extract(&self, doc: &Value, cutoff: Cutoff) -> Option<Vec<Post>> {
        let mut posts = Vec::new();
        Self::walk(doc, cutoff, &mut posts);
        Some(posts)
    }
}

fn media_candidate(node: &Value) -> Option<MediaRecord<'_>> {
    let media = node.field("media")?;
    let caption = media.field("caption")?;
    let text = caption.field("text")?.as_str()?;
    let created_at = caption.field("created_at")?.as_instant()?;

    Some(MediaRecord {
        created_at,
        text,
        username: caption
            .field("user")
            .map(|user| user.str_or_default("username"))
            .unwrap_or_default(),
        comment_count: media
            .field("comment_count")
            .and_then(ValueExt::as_count)
            .unwrap_or_default(),
        code: media.field("code").and_then(Value::as_str),
    })
}

/// Posts plus the name of the strategy that produced them.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub posts: Vec<Post>,
    pub strategy: &'static str,
}

pub struct Extractor {
    strategies: Vec<Box<dyn ExtractStrategy>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(vec![Box::new(EnvelopeStrategy), Box::new(TreeWalkStrategy)])
    }
}

impl Extractor {
    pub fn new(strategies: Vec<Box<dyn ExtractStrategy>>) -> Self {
        Self { strategies }
    }

    /// Parse `raw` and extract posts created at or after `cutoff`.
    ///
    /// ```
    /// use tagscope_common::Cutoff;
    /// use tagscope_social::instagram::Extractor;
    ///
    /// let raw = br#"{"data":{"top":{"sections":[{"layout_content":{"medias":[
    ///     {"media":{"code":"ABC123","comment_count":3,
    ///       "caption":{"created_at":1700000000,"text":"hi","user":{"username":"alice"}}}}
    /// ]}}]}}}"#;
    ///
    /// let out = Extractor::default()
    ///     .extract(raw, Cutoff::from_unix(1600000000))
    ///     .unwrap();
    /// assert_eq!(out.strategy, "envelope");
    /// assert_eq!(out.posts.len(), 1);
    /// assert_eq!(out.posts[0].post_url, "https://www.instagram.com/p/ABC123/");
    /// ```
    pub fn extract(&self, raw: &[u8], cutoff: Cutoff) -> Result<Extraction, ExtractError> {
        let doc: Value = serde_json::from_slice(raw)?;
        self.extract_value(&doc, cutoff)
    }

    pub fn extract_value(&self, doc: &Value, cutoff: Cutoff) -> Result<Extraction, ExtractError> {
        for strategy in &self.strategies {
            if let Some(posts) = strategy.extract(doc, cutoff) {
                tracing::info!(
                    strategy = strategy.name(),
                    cutoff = %cutoff,
                    posts = posts.len(),
                    "extract.done"
                );
                return Ok(Extraction {
                    posts,
                    strategy: strategy.name(),
                });
            }
        }
        Err(ExtractError::Unrecognised)
    }
}

/// Extract with the default strategy list.
pub fn extract_posts(raw: &[u8], cutoff: Cutoff) -> Result<Vec<Post>, ExtractError> {
    Extractor::default().extract(raw, cutoff).map(|e| e.posts)
}
