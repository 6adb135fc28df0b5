use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

use crate::{
    audit,
    domain::permissions::Role,
    dto::users::{AddUserRequest, DeleteUserRequest, UserList},
    entity::users::{ActiveModel as UserActive, Column, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_superadmin},
    models::User,
    response::{Ack, ApiResponse, Meta},
    services::auth_service::hash_password,
    state::AppState,
};

pub async fn get_users(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserList>> {
    ensure_superadmin(user)?;
    let items = Users::find()
        .order_by_asc(Column::Username)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(user_from_entity)
        .collect::<AppResult<Vec<_>>>()?;
    let total = items.len();
    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::all(total)),
    ))
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn add_user(
    state: &AppState,
    user: &AuthUser,
    payload: AddUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_superadmin(user)?;
    let (Some(username), Some(password), Some(role)) = (
        required(payload.username),
        payload.password.filter(|p| !p.is_empty()),
        required(payload.role),
    ) else {
        return Err(AppError::bad_request("Missing data"));
    };
    let role: Role = role
        .parse()
        .map_err(|_| AppError::bad_request("Invalid role"))?;

    let existing = Users::find_by_id(username.clone()).one(&state.orm).await?;
    if existing.is_some() {
        return Err(AppError::bad_request("Username already exists"));
    }

    let created = UserActive {
        username: Set(username),
        password_hash: Set(hash_password(&password)?),
        role: Set(role.as_str().to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(username = %created.username, role = %role, "user added");
    audit::record(
        &state.pool,
        Some(&user.username),
        "user_add",
        "users",
        serde_json::json!({ "username": created.username, "role": role }),
    )
    .await;

    Ok(ApiResponse::success(
        "User added",
        user_from_entity(created)?,
        Some(Meta::empty()),
    ))
}

pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    payload: DeleteUserRequest,
) -> AppResult<ApiResponse<Ack>> {
    ensure_superadmin(user)?;
    let username =
        required(payload.username).ok_or_else(|| AppError::bad_request("Username is required"))?;
    if username == user.username {
        return Err(AppError::bad_request("Cannot delete yourself"));
    }

    let result = Users::delete_by_id(username.clone()).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(username = %username, "user deleted");
    audit::record(
        &state.pool,
        Some(&user.username),
        "user_delete",
        "users",
        serde_json::json!({ "username": username }),
    )
    .await;

    Ok(ApiResponse::ack("User deleted"))
}

fn user_from_entity(model: UserModel) -> AppResult<User> {
    Ok(User {
        role: model
            .role
            .parse()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("user {} has unknown role {}", model.username, model.role)))?,
        username: model.username,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
