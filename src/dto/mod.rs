pub mod auth;
pub mod items;
pub mod orders;
pub mod signage;
pub mod users;
