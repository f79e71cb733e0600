use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

/// Request-level failure. Every variant renders as a status plus a short plaintext body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("Invalid credentials")]
    Unauthorized,
    #[error("Email already registered")]
    Conflict,
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "rejected request payload");
        Self::BadRequest("Invalid request payload")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            error!(error = ?e, "request failed");
        }
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, String) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
        (status, String::from_utf8(bytes.to_vec()).expect("utf8"))
    }

    #[tokio::test]
    async fn internal_detail_is_not_exposed() {
        let err = AppError::internal(anyhow::anyhow!("relation \"users\" does not exist"));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal server error");
    }

    #[tokio::test]
    async fn client_errors_map_to_their_status() {
        assert_eq!(
            body_of(AppError::BadRequest("Invalid email")).await,
            (StatusCode::BAD_REQUEST, "Invalid email".to_string())
        );
        assert_eq!(
            body_of(AppError::Unauthorized).await,
            (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
        );
        assert_eq!(
            body_of(AppError::Conflict).await,
            (StatusCode::CONFLICT, "Email already registered".to_string())
        );
    }
}
