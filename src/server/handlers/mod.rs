//! HTTP handlers for the server.

pub mod batch;
pub mod export;
pub mod generate;
pub mod history;
pub mod scan;
pub mod share;
pub mod templates;

use axum::{
    Json, async_trait,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error};

use crate::error::QrForgeError;

pub type ApiResult<T> = Result<T, QrForgeError>;

/// HTTP status for each error class.
pub fn status_for(err: &QrForgeError) -> StatusCode {
    match err {
        QrForgeError::Validation(_) => StatusCode::BAD_REQUEST,
        QrForgeError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
        QrForgeError::NotFound(_) => StatusCode::NOT_FOUND,
        QrForgeError::Capability(_) => StatusCode::SERVICE_UNAVAILABLE,
        QrForgeError::Encode(_)
        | QrForgeError::Export(_)
        | QrForgeError::Storage(_)
        | QrForgeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for QrForgeError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// `Json` whose rejections are validation errors.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = QrForgeError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| QrForgeError::Validation(e.body_text()))?;
        Ok(Self(value))
    }
}

/// Run blocking work (encode, decode, export) off the async runtime.
pub async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| QrForgeError::Io(std::io::Error::other(format!("Task error: {}", e))))?
}
