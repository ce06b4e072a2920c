//! Social network clients, extractors and exporters used by tagscope.
//!
//! The Instagram hashtag pipeline lives here: [`instagram`] fetches and parses
//! tag feeds, [`export`] persists the simplified posts, and [`pipeline`] wires
//! fetch, file hand-off, extraction and export together for one request.
pub mod export;
pub mod instagram;
pub mod pipeline;

pub use export::{CsvHeader, ExportError, PostWriter};
pub use instagram::{Extractor, InstagramApi, InstagramCredentials, Post};
pub use pipeline::{ArtifactPaths, PipelineError, PipelineOutput, TagFeedSource, TagPipeline};
