//! Fetch → persist raw → extract → persist outputs, for one hashtag.
//!
//! Each run is independent. Artifacts are keyed by hashtag only, so two runs
//! for the same tag overwrite each other's files (last writer wins).
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tagscope_common::{Cutoff, Hashtag};
use tagscope_http::HttpError;

use crate::export::{CsvHeader, ExportError, PostWriter};
use crate::instagram::{ExtractError, Extractor};

/// Where raw tag-feed documents come from.
#[async_trait]
pub trait TagFeedSource: Send + Sync {
    async fn fetch_tag_feed(&self, hashtag: &Hashtag) -> Result<Bytes, HttpError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub raw: PathBuf,
    pub json: PathBuf,
    pub csv: PathBuf,
}

impl ArtifactPaths {
    pub fn for_hashtag(dir: &Path, hashtag: &Hashtag) -> Self {
        Self {
            raw: dir.join(format!("posts_{hashtag}.json")),
            json: dir.join(format!("extracted_posts_{hashtag}.json")),
            csv: dir.join(format!("extracted_posts_{hashtag}.csv")),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] HttpError),

    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write raw artifact {}: {source}", path.display())]
    WriteRaw {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read raw artifact {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse failed: {0}")]
    Parse(#[from] ExtractError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("pipeline task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Extracted JSON document, byte-identical to the `json` artifact.
    pub body: Vec<u8>,
    pub post_count: usize,
    pub strategy: &'static str,
    pub paths: ArtifactPaths,
}

#[derive(Clone)]
pub struct TagPipeline {
    source: Arc<dyn TagFeedSource>,
    output_dir: PathBuf,
    writer: PostWriter,
    extractor: Arc<Extractor>,
}

impl TagPipeline {
    pub fn new(source: Arc<dyn TagFeedSource>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            output_dir: output_dir.into(),
            writer: PostWriter::default(),
            extractor: Arc::new(Extractor::default()),
        }
    }

    pub fn with_csv_header(mut self, header: CsvHeader) -> Self {
        self.writer = PostWriter::new(header);
        self
    }

    pub async fn run(
        &self,
        hashtag: &Hashtag,
        cutoff: Cutoff,
    ) -> Result<PipelineOutput, PipelineError> {
        let raw = self.source.fetch_tag_feed(hashtag).await?;
        tracing::info!(%hashtag, bytes = raw.len(), "pipeline.fetch.done");

        let paths = ArtifactPaths::for_hashtag(&self.output_dir, hashtag);
        let output_dir = self.output_dir.clone();
        let writer = self.writer;
        let extractor = Arc::clone(&self.extractor);

        let output = tokio::task::spawn_blocking(move || {
            persist_and_extract(&output_dir, &raw, paths, cutoff, &extractor, writer)
        })
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))??;

        tracing::info!(
            %hashtag,
            cutoff = %cutoff.describe(),
            posts = output.post_count,
            strategy = output.strategy,
            "pipeline.done"
        );
        Ok(output)
    }
}

fn persist_and_extract(
    output_dir: &Path,
    raw: &[u8],
    paths: ArtifactPaths,
    cutoff: Cutoff,
    extractor: &Extractor,
    writer: PostWriter,
) -> Result<PipelineOutput, PipelineError> {
    fs::create_dir_all(output_dir).map_err(|source| PipelineError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;
    fs::write(&paths.raw, raw).map_err(|source| PipelineError::WriteRaw {
        path: paths.raw.clone(),
        source,
    })?;

    let input = fs::read(&paths.raw).map_err(|source| PipelineError::ReadInput {
        path: paths.raw.clone(),
        source,
    })?;
    let extraction = extractor.extract(&input, cutoff)?;
    let body = writer.write(&extraction.posts, &paths.json, &paths.csv)?;

    Ok(PipelineOutput {
        body,
        post_count: extraction.posts.len(),
        strategy: extraction.strategy,
        paths,
    })
}
