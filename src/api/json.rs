//! JSON body extractor whose rejections use the API error envelope.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use super::ApiError;

/// Like [`axum::Json`], but an undecodable body (bad syntax, missing or
/// mistyped fields, wrong content type) becomes a 400 [`ApiError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        Self::validation("Invalid request payload")
    }
}
