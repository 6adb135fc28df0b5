use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    domain::permissions::Page,
    dto::auth::{LoginRequest, LoginResponse, Me, PageAccess},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::auth_service::{login_user, me as current_user, page_access},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/access/{page}", get(access))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user and the screens they may open", body = ApiResponse<Me>)
    ),
    tag = "Auth"
)]
pub async fn me(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<ApiResponse<Me>>> {
    Ok(Json(current_user(&state, &user).await?))
}

#[utoipa::path(
    get,
    path = "/api/auth/access/{page}",
    params(
        ("page" = String, Path, description = "kitchen, display, cashier or admin")
    ),
    responses(
        (status = 200, description = "Whether the current user may open the page", body = ApiResponse<PageAccess>)
    ),
    tag = "Auth"
)]
pub async fn access(
    State(state): State<AppState>,
    user: AuthUser,
    Path(page): Path<String>,
) -> AppResult<Json<ApiResponse<PageAccess>>> {
    let page: Page = page.parse()?;
    Ok(Json(page_access(&state, &user, page).await?))
}
