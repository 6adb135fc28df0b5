use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use sea_orm::EntityTrait;

use crate::{
    audit,
    domain::permissions::{Page, Role},
    dto::auth::{Claims, LoginRequest, LoginResponse, Me, PageAccess},
    entity::users::Entity as Users,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::settings_service,
    state::{AppState, JwtSettings},
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(jwt: &JwtSettings, username: &str, role: Role) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(jwt.ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: username.to_string(),
        role,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_token(secret: &str, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))
}

/// Verifies `token` and reloads the account it names, so tokens of deleted
/// accounts stop working and role changes apply immediately.
pub async fn authenticate(state: &AppState, token: &str) -> AppResult<AuthUser> {
    let claims = verify_token(&state.jwt.secret, token)?;
    let user = Users::find_by_id(claims.sub.clone())
        .one(&state.orm)
        .await?
        .ok_or_else(|| {
            tracing::debug!(username = %claims.sub, "token names a missing account");
            AppError::Unauthorized("Account no longer exists".into())
        })?;
    let role: Role = user
        .role
        .parse()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("user {} has an unknown role", user.username)))?;
    Ok(AuthUser {
        username: user.username,
        role,
    })
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { username, password } = payload;
    let user = Users::find_by_id(username.trim().to_string())
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("Invalid username or password".into())),
    };

    if !verify_password(&password, &user.password_hash)? {
        tracing::info!(username = %user.username, "login rejected");
        return Err(AppError::Unauthorized("Invalid username or password".into()));
    }

    let role: Role = user
        .role
        .parse()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("user {} has an unknown role", user.username)))?;
    let token = issue_token(&state.jwt, &user.username, role)?;

    audit::record(
        &state.pool,
        Some(&user.username),
        "user_login",
        "users",
        serde_json::json!({ "username": user.username }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
            username: user.username,
            role,
        },
        Some(Meta::empty()),
    ))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Me>> {
    let permissions = settings_service::load_permissions(state).await?;
    let pages = Page::ALL
        .into_iter()
        .filter(|p| permissions.allows(user.role, *p))
        .collect();
    Ok(ApiResponse::success(
        "Current user",
        Me {
            username: user.username.clone(),
            role: user.role,
            pages,
        },
        Some(Meta::empty()),
    ))
}

pub async fn page_access(
    state: &AppState,
    user: &AuthUser,
    page: Page,
) -> AppResult<ApiResponse<PageAccess>> {
    let permissions = settings_service::load_permissions(state).await?;
    Ok(ApiResponse::success(
        "Page access",
        PageAccess {
            page,
            allowed: permissions.allows(user.role, page),
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn jwt() -> JwtSettings {
        JwtSettings {
            secret: Arc::from("test-secret"),
            ttl_hours: 1,
        }
    }

    #[test]
    fn token_round_trip_keeps_username_and_role() {
        let token = issue_token(&jwt(), "kitchen01", Role::Staff).unwrap();
        let claims = verify_token("test-secret", &token).unwrap();
        assert_eq!(claims.sub, "kitchen01");
        assert_eq!(claims.role, Role::Staff);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token(&jwt(), "kitchen01", Role::Admin).unwrap();
        let err = verify_token("another-secret", &token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("yakisoba").unwrap();
        assert!(verify_password("yakisoba", &hash).unwrap());
        assert!(!verify_password("takoyaki", &hash).unwrap());
    }
}
