//! Request-level errors shared by HTTP and WebSocket handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown session: {0}")]
    UnknownSession(String),

    #[error("unknown challenge: {0}")]
    UnknownChallenge(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnknownSession(_) => StatusCode::UNAUTHORIZED,
            AppError::UnknownChallenge(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(AppError::UnknownChallenge("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::UnknownSession("s".into()).status(), StatusCode::UNAUTHORIZED);
        let store = AppError::from(StoreError::InvalidKey("..".into()));
        assert_eq!(store.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
