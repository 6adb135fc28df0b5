use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::users::{AddUserRequest, DeleteUserRequest, UserList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::User,
    response::{Ack, ApiResponse},
    services::user_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get_users", get(get_users))
        .route("/add_user", post(add_user))
        .route("/delete_user", post(delete_user))
}

#[utoipa::path(
    get,
    path = "/api/get_users",
    responses(
        (status = 200, description = "Accounts without password hashes", body = ApiResponse<UserList>),
        (status = 403, description = "Superadmin only")
    ),
    tag = "Users"
)]
pub async fn get_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserList>>> {
    Ok(Json(user_service::get_users(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/add_user",
    request_body = AddUserRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<User>),
        (status = 400, description = "Missing data, invalid role or duplicate username")
    ),
    tag = "Users"
)]
pub async fn add_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp = user_service::add_user(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/delete_user",
    request_body = DeleteUserRequest,
    responses(
        (status = 200, description = "Account deleted", body = ApiResponse<Ack>),
        (status = 400, description = "Missing username or deleting yourself")
    ),
    tag = "Users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<DeleteUserRequest>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    Ok(Json(user_service::delete_user(&state, &user, payload).await?))
}
