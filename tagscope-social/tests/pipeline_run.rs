mod common;

use std::sync::Arc;
use std::time::Duration;

use tagscope_common::{Cutoff, Hashtag};
use tagscope_social::instagram::PostsDocument;
use tagscope_social::{CsvHeader, InstagramApi, InstagramCredentials, PipelineError, TagPipeline};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn feed_server(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tags/web_info/"))
        .and(query_param("tag_name", "kitten"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

fn pipeline(server: &MockServer, dir: &std::path::Path) -> anyhow::Result<TagPipeline> {
    let api = InstagramApi::new(
        &server.uri(),
        InstagramCredentials::default(),
        Duration::from_secs(5),
    )?;
    Ok(TagPipeline::new(Arc::new(api), dir.join("output")))
}

#[tokio::test]
async fn run_writes_all_three_artifacts() -> anyhow::Result<()> {
    common::init_test_tracing();
    let server = feed_server(200, common::SAMPLE_FEED).await;
    let dir = tempfile::tempdir()?;
    let tag = Hashtag::parse("kitten")?;

    let out = pipeline(&server, dir.path())?
        .run(&tag, Cutoff::from_unix(1_600_000_000))
        .await?;

    assert_eq!(out.strategy, "envelope");
    assert_eq!(out.post_count, 1);
    assert_eq!(std::fs::read(&out.paths.raw)?, common::SAMPLE_FEED.as_bytes());
    assert_eq!(std::fs::read(&out.paths.json)?, out.body);

    let doc: PostsDocument = serde_json::from_slice(&out.body)?;
    assert_eq!(doc.posts[0].owner_username, "alice");
    assert_eq!(doc.posts[0].comment_count, 3);
    assert_eq!(doc.posts[0].post_url, "https://www.instagram.com/p/ABC123/");

    let csv = std::fs::read_to_string(&out.paths.csv)?;
    assert_eq!(
        csv,
        concat!(
            "akun yang posting,konten,jumlah komentar,url postingan\n",
            "alice,hi,3,https://www.instagram.com/p/ABC123/\n",
        )
    );
    Ok(())
}

#[tokio::test]
async fn english_header_is_configurable() -> anyhow::Result<()> {
    common::init_test_tracing();
    let server = feed_server(200, common::SAMPLE_FEED).await;
    let dir = tempfile::tempdir()?;

    let out = pipeline(&server, dir.path())?
        .with_csv_header(CsvHeader::English)
        .run(&Hashtag::parse("kitten")?, Cutoff::from_unix(0))
        .await?;

    assert_eq!(out.post_count, 2);
    let csv = std::fs::read_to_string(&out.paths.csv)?;
    assert!(csv.starts_with("owner account,content,comment count,post url\n"));
    assert_eq!(csv.lines().count(), 3);
    Ok(())
}

#[tokio::test]
async fn upstream_error_is_a_fetch_failure() -> anyhow::Result<()> {
    common::init_test_tracing();
    let server = feed_server(500, "oops").await;
    let dir = tempfile::tempdir()?;

    let err = pipeline(&server, dir.path())?
        .run(&Hashtag::parse("kitten")?, Cutoff::from_unix(0))
        .await
        .expect_err("500 upstream must fail");

    assert!(matches!(err, PipelineError::Fetch(_)), "got {err:?}");
    assert!(!dir.path().join("output").exists());
    Ok(())
}
