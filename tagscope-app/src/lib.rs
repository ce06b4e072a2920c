//! HTTP surface of tagscope: the `/posts` hashtag endpoint and `/health`.
use actix_cors::Cors;
use actix_web::web;
use tagscope_common::DEFAULT_WINDOW_DAYS;
use tagscope_social::TagPipeline;

pub mod error;
pub mod routes;

pub use error::AppError;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: TagPipeline,
    /// Recency window applied when a request carries no `limit`.
    pub default_window_days: u32,
}

impl AppState {
    pub fn new(pipeline: TagPipeline) -> Self {
        Self {
            pipeline,
            default_window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    pub fn with_default_window_days(mut self, days: u32) -> Self {
        self.default_window_days = days;
        self
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/posts", web::get().to(routes::get_posts))
        .route("/health", web::get().to(routes::health));
}

/// CORS policy: `*` allows any origin, anything else is an exact origin.
pub fn cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default();
    for origin in allowed_origins.iter().map(|o| o.trim()) {
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allowed_methods(["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(["Content-Type", "Authorization"])
}
