use axum::{extract::FromRequestParts, http::header};

use crate::{
    domain::permissions::{Page, Role},
    error::AppError,
    services::{auth_service::authenticate, settings_service},
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub role: Role,
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Admin screens are open to `admin` and `superadmin`.
pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_superadmin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Superadmin)
}

/// Checks the configurable role table: the user must be allowed on at least
/// one of `pages`.
pub async fn ensure_page(state: &AppState, user: &AuthUser, pages: &[Page]) -> Result<(), AppError> {
    if user.role == Role::Superadmin {
        return Ok(());
    }
    let permissions = settings_service::load_permissions(state).await?;
    if permissions.allows_any(user.role, pages) {
        Ok(())
    } else {
        tracing::debug!(username = %user.username, role = %user.role, ?pages, "page access denied");
        Err(AppError::Forbidden)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?
            .trim();

        authenticate(state, token).await
    }
}
