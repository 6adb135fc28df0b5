use std::sync::Arc;

use crate::{
    db::{DbPool, OrmConn},
    live::LiveOrderHub,
};

/// JWT signing parameters shared by the login handler and the auth extractor.
#[derive(Clone)]
pub struct JwtSettings {
    pub secret: Arc<str>,
    pub ttl_hours: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub live: LiveOrderHub,
    pub jwt: JwtSettings,
}
