//! HTTP error envelope
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::errors::RagError;

/// Errors returned from route handlers, rendered as `{status, detail}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error(transparent)]
    Rag(#[from] RagError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Rag(err) => match err {
                RagError::Validation(_) => StatusCode::BAD_REQUEST,
                RagError::Upstream { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                RagError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "detail": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (
                ApiError::from(RagError::Validation("No messages provided".into())),
                400,
            ),
            (ApiError::Unprocessable("missing field".into()), 422),
            (
                ApiError::from(RagError::Upstream {
                    status: 404,
                    body: "model not found".into(),
                }),
                404,
            ),
            (ApiError::from(RagError::Timeout { duration_ms: 120_000 }), 504),
            (ApiError::from(RagError::Storage("down".into())), 500),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code().as_u16(), expected, "{}", err);
        }
    }

    #[test]
    fn test_upstream_detail_carries_body() {
        let err = ApiError::from(RagError::Upstream {
            status: 500,
            body: "out of memory".into(),
        });
        assert_eq!(err.to_string(), "Ollama API error: out of memory");
    }

    #[test]
    fn test_invalid_upstream_status_falls_back() {
        let err = ApiError::from(RagError::Upstream {
            status: 42,
            body: String::new(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
