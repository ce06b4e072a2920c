#![allow(dead_code)]

use std::sync::OnceLock;

use tagscope_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "tagscope-tests",
            log_dir: Some(std::env::temp_dir().join("tagscope-tests")),
            emit_stderr: true,
            format: LogFormat::from_env(),
            default_filter: "debug",
        };

        tagscope_common::observability::init_logging(config).unwrap_or_default()
    });
}

pub const SAMPLE_FEED: &str = r#"{
  "status": "ok",
  "data": {
    "name": "kitten",
    "top": {
      "more_available": false,
      "sections": [
        {
          "layout_type": "media_grid",
          "layout_content": {
            "medias": [
              { "media": { "code": "ABC123", "comment_count": 3,
                "caption": { "created_at": 1700000000, "text": "hi", "user": { "username": "alice" } } } },
              { "media": { "code": "OLD1", "comment_count": 9,
                "caption": { "created_at": 1500000000, "text": "old", "user": { "username": "bob" } } } }
            ]
          }
        }
      ]
    }
  }
}"#;
