use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header, request::Parts},
};
use std::sync::Arc;

use crate::{
    error::AppError,
    models::user::User,
    services::auth,
    AppState,
};

/// A request carrying a valid, non-revoked bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// Bearer JWT extractor
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Access token required".into()))?
            .to_string();

        if auth::is_revoked(&state.db.pool, &token).await? {
            return Err(AppError::Unauthorized("Token has been invalidated".into()));
        }

        let invalid = || AppError::Unauthorized("Invalid or expired token".into());
        let claims = state.tokens.verify(&token).ok_or_else(invalid)?;
        // a deleted account's tokens stop working immediately
        let user = User::find_by_id(&state.db.pool, claims.sub)
            .await?
            .ok_or_else(invalid)?;

        Ok(AuthUser { user, token })
    }
}

/// An [`AuthUser`] with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let AuthUser { user, .. } = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".into()));
        }
        Ok(AdminUser(user))
    }
}

/// `axum::Json` whose rejections render as `AppError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Path` whose rejections render as `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// `axum::extract::Query` whose rejections render as `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
