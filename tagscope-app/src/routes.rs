use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tagscope_common::{Cutoff, Hashtag};

use crate::{AppError, AppState};

/// Both fields stay optional so that a missing `hashtag` reaches the handler
/// and gets the JSON error body instead of actix's plain-text rejection.
#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    pub hashtag: Option<String>,
    pub limit: Option<String>,
}

pub async fn get_posts(
    state: web::Data<AppState>,
    query: web::Query<PostsQuery>,
) -> Result<HttpResponse, AppError> {
    let PostsQuery { hashtag, limit } = query.into_inner();

    let raw_tag = hashtag.unwrap_or_default();
    if raw_tag.trim().is_empty() {
        tracing::warn!("posts.request.rejected: hashtag parameter missing");
        return Err(AppError::BadRequest(
            "Query parameter 'hashtag' is required.".to_string(),
        ));
    }
    let hashtag = Hashtag::parse(&raw_tag).map_err(|e| {
        tracing::warn!(hashtag = %raw_tag, error = %e, "posts.request.rejected");
        AppError::BadRequest(e.to_string())
    })?;

    let cutoff = match limit.as_deref() {
        None | Some("") => {
            let cutoff = Cutoff::days_ago(state.default_window_days).map_err(|e| {
                tracing::error!(%hashtag, error = %e, "posts.cutoff.window_invalid");
                AppError::Cutoff(e)
            })?;
            tracing::info!(
                %hashtag,
                days = state.default_window_days,
                cutoff = %cutoff.describe(),
                unix = cutoff.unix(),
                "posts.cutoff.default"
            );
            cutoff
        }
        Some(raw) => {
            let cutoff: Cutoff = raw.parse().map_err(|e| {
                tracing::error!(%hashtag, limit = raw, error = %e, "posts.cutoff.invalid");
                AppError::Cutoff(e)
            })?;
            tracing::info!(
                %hashtag,
                cutoff = %cutoff.describe(),
                unix = cutoff.unix(),
                "posts.cutoff.explicit"
            );
            cutoff
        }
    };

    let output = state.pipeline.run(&hashtag, cutoff).await.map_err(|e| {
        tracing::error!(%hashtag, error = %e, "posts.pipeline.failed");
        AppError::from(e)
    })?;

    tracing::info!(
        %hashtag,
        posts = output.post_count,
        strategy = output.strategy,
        "posts.request.done"
    );
    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(output.body))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
