use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod doc;
pub mod health;
pub mod items;
pub mod live;
pub mod menu;
pub mod orders;
pub mod reset;
pub mod sales;
pub mod settings;
pub mod signage;
pub mod upload;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(menu::router())
        .merge(orders::router())
        .merge(items::router())
        .merge(signage::router())
        .merge(sales::router())
        .merge(users::router())
        .merge(settings::router())
        .merge(reset::router())
}
