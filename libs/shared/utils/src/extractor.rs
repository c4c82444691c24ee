use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::{ActingUser, USER_ID_HEADER};
use shared_models::error::AppError;

/// JSON body whose rejections render as [`AppError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query string whose rejections render as [`AppError::BadRequest`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Path parameters whose rejections render as [`AppError::BadRequest`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// The acting identity of a request, taken from the `x-user-id` header.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub ActingUser);

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(USER_ID_HEADER).ok_or_else(|| {
            debug!("Request to {} carries no x-user-id header", parts.uri.path());
            AppError::Unauthenticated("Missing x-user-id header".to_string())
        })?;

        let raw = header
            .to_str()
            .map_err(|_| AppError::Unauthenticated("Invalid x-user-id header".to_string()))?;

        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::Unauthenticated("x-user-id must be a UUID".to_string()))?;

        Ok(CurrentUser(ActingUser::new(id)))
    }
}
