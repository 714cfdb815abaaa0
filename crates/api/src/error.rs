//! Error types for the API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors that can occur while handling a request.
///
/// Malformed client input never reaches this type (it is normalized away in
/// the handlers), so everything here maps to a server-error envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] database::DatabaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                err.to_string()
            }
        };

        let body = serde_json::json!({
            "ok": false,
            "error": message,
        });

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use database::DatabaseError;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn database_error_becomes_json_envelope() {
        let error = ApiError::Database(DatabaseError::Sqlx(sqlx::Error::PoolClosed));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["ok"], serde_json::json!(false));
        assert!(value["error"].is_string());
    }
}
