//! Request failures and their HTTP rendering.
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use tagscope_common::CommonError;
use tagscope_social::PipelineError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Bad `hashtag` parameter; the pipeline never ran.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Cutoff(CommonError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Pipeline(PipelineError::Fetch(_)) => StatusCode::BAD_GATEWAY,
            AppError::Cutoff(_) | AppError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        HttpResponse::build(self.status_code()).json(ErrorBody { error: &message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tagscope_http::HttpError;

    #[test]
    fn maps_failures_to_status_codes() {
        assert_eq!(
            AppError::BadRequest("missing".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Cutoff(CommonError::WindowOutOfRange { days: u32::MAX }).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(PipelineError::Fetch(HttpError::Timeout(Duration::from_secs(1))))
                .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(PipelineError::Task("join".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
