//! Persist extracted posts as an indented JSON document and a CSV table.
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::instagram::Post;

/// Column labels for the CSV header row. Column order is the same for both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CsvHeader {
    #[default]
    Indonesian,
    English,
}

impl CsvHeader {
    pub fn labels(self) -> [&'static str; 4] {
        match self {
            CsvHeader::Indonesian => [
                "akun yang posting",
                "konten",
                "jumlah komentar",
                "url postingan",
            ],
            CsvHeader::English => ["owner account", "content", "comment count", "post url"],
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("failed to serialize posts: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Serialize)]
struct PostsView<'a> {
    posts: &'a [Post],
}

/// Render `{"posts": [...]}` with four-space indentation.
pub fn render_json(posts: &[Post]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    PostsView { posts }.serialize(&mut ser)?;
    Ok(buf)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostWriter {
    header: CsvHeader,
}

impl PostWriter {
    pub fn new(header: CsvHeader) -> Self {
        Self { header }
    }

    /// Overwrite both artifacts and return the JSON bytes that were written.
    pub fn write(
        &self,
        posts: &[Post],
        json_path: &Path,
        csv_path: &Path,
    ) -> Result<Vec<u8>, ExportError> {
        let body = render_json(posts)?;
        fs::write(json_path, &body).map_err(|source| ExportError::Io {
            path: json_path.to_path_buf(),
            source,
        })?;
        self.write_csv(posts, csv_path)?;

        tracing::info!(
            posts = posts.len(),
            json = %json_path.display(),
            csv = %csv_path.display(),
            "export.done"
        );
        Ok(body)
    }

    fn write_csv(&self, posts: &[Post], path: &Path) -> Result<(), ExportError> {
        let csv_err = |source: csv::Error| ExportError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
        wtr.write_record(self.header.labels()).map_err(csv_err)?;
        for post in posts {
            let comments = post.comment_count.to_string();
            wtr.write_record([
                post.owner_username.as_str(),
                post.text.as_str(),
                comments.as_str(),
                post.post_url.as_str(),
            ])
            .map_err(csv_err)?;
        }
        wtr.flush().map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
