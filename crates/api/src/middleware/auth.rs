//! Authentication extractors.
//!
//! Handlers take [`CurrentUser`] (any authenticated, active account) or
//! [`RequireStaff`] (staff accounts only). Both read the
//! `Authorization: Bearer <token>` header, verify the JWT, and load the user
//! so deactivated accounts are rejected even while their tokens are still
//! formally valid.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Extractor that requires an authenticated, active user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     format!("hello, {}", user.email)
/// }
/// ```
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing authorization header".to_owned()))?;

        let token = crate::services::JwtKeys::extract_from_header(header)
            .ok_or_else(|| AppError::Unauthorized("invalid authorization header".to_owned()))?;

        let user_id = state.jwt().verify(token)?;

        let user = UserRepository::new(state.pool())
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("unknown user".to_owned()))?;

        if !user.is_active {
            return Err(AppError::Forbidden("account is inactive".to_owned()));
        }

        Ok(Self(user))
    }
}

/// Extractor that requires a staff user.
pub struct RequireStaff(pub User);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_staff {
            return Err(AppError::Forbidden("staff only".to_owned()));
        }

        Ok(Self(user))
    }
}
