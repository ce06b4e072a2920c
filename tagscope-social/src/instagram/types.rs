//! Typed envelope of the `api/v1/tags/web_info/` response.
//!
//! Only the path down to each media's caption is modelled, plus a few feed
//! fields surfaced in logs. `data.top.sections` is required so that a document
//! without that path fails to decode instead of decoding to an empty feed.
use serde::Deserialize;

use crate::instagram::post::MediaRecord;

#[derive(Debug, Clone, Deserialize)]
pub struct TagWebInfo {
    pub data: TagData,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagData {
    pub top: SectionFeed,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub media_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionFeed {
    pub sections: Vec<Section>,
    #[serde(default)]
    pub more_available: Option<bool>,
    #[serde(default)]
    pub next_max_id: Option<String>,
    #[serde(default)]
    pub next_page: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub layout_type: Option<String>,
    #[serde(default)]
    pub layout_content: Option<LayoutContent>,
}

impl Section {
    /// `fill_items` (clips layout) when non-empty, otherwise `medias` (grid
    /// layout).
    pub fn items(&self) -> &[MediaItem] {
        let Some(content) = &self.layout_content else {
            return &[];
        };
        match (&content.fill_items, &content.medias) {
            (Some(fill), _) if !fill.is_empty() => fill.as_slice(),
            (_, Some(medias)) => medias.as_slice(),
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutContent {
    #[serde(default)]
    pub fill_items: Option<Vec<MediaItem>>,
    #[serde(default)]
    pub medias: Option<Vec<MediaItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaItem {
    #[serde(default)]
    pub media: Option<Media>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub caption: Option<Caption>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub comment_count: Option<u64>,
}

impl Media {
    /// `None` for captionless media, which carry no creation time to filter on.
    pub fn record(&self) -> Option<MediaRecord<'_>> {
        let caption = self.caption.as_ref()?;
        Some(MediaRecord {
            created_at: caption.created_at,
            text: &caption.text,
            username: caption
                .user
                .as_ref()
                .and_then(|u| u.username.as_deref())
                .unwrap_or_default(),
            comment_count: self.comment_count.unwrap_or_default(),
            code: self.code.as_deref(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Caption {
    pub created_at: i64,
    pub text: String,
    #[serde(default)]
    pub user: Option<CaptionUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptionUser {
    #[serde(default)]
    pub username: Option<String>,
}
