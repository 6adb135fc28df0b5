pub mod auth_service;
pub mod menu_service;
pub mod order_service;
pub mod reset_service;
pub mod sales_service;
pub mod settings_service;
pub mod signage_service;
pub mod user_service;
