//! Instagram tag-feed integration.
//!
//! Submodules provide the HTTP client wrapper, the strongly typed envelope of
//! the `tags/web_info` response, untyped JSON accessors, and the extractor
//! that turns either shape into [`Post`] records.
pub mod client;
pub mod extract;
pub mod post;
pub mod types;
pub mod value;

pub use client::{InstagramApi, InstagramCredentials};
pub use extract::{Extraction, ExtractError, ExtractStrategy, Extractor, extract_posts};
pub use post::{Post, PostsDocument};
