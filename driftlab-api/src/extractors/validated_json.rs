//! JSON body extractor with API-shaped rejections.
//!
//! Scenario request types validate while deserializing, so a body that
//! decodes is already a valid request. Every rejection is reported as an
//! [`ApiError`] with status 400 instead of Axum's plain-text 415/422.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Extractor for a JSON body that must deserialize into `T`.
///
/// # Example
///
/// ```rust,ignore
/// async fn invalidation(
///     ValidatedJson(request): ValidatedJson<InvalidationRequest>,
/// ) -> ApiResult<Json<ScenarioReport>> {
///     // request.key() is non-blank here
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(error = %rejection.body_text(), "Rejected request body");
            ApiError::from(rejection)
        })?;
        Ok(ValidatedJson(value))
    }
}
