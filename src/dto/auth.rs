use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::permissions::{Page, Role};

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PageAccess {
    pub page: Page,
    pub allowed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Me {
    pub username: String,
    pub role: Role,
    /// Staff screens this user may open.
    pub pages: Vec<Page>,
}
