//! Destructive maintenance actions from the superadmin panel.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};

use crate::{
    audit,
    entity::{
        menu_items::Entity as MenuItems,
        orders::Entity as Orders,
        settings::{Entity as Settings, SIGNAGE_SETTINGS_KEY},
        signage_items::Entity as SignageItems,
        users::{Column as UserCol, Entity as Users},
    },
    error::AppResult,
    live::OrderEvent,
    middleware::auth::{AuthUser, ensure_superadmin},
    response::{Ack, ApiResponse},
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    /// Orders, menu and signage.
    Data,
    /// `Data` plus every account except the caller.
    AllButCaller,
    /// `Data` plus every account.
    Everything,
}

impl ResetScope {
    pub fn action(&self) -> &'static str {
        match self {
            ResetScope::Data => "reset_data",
            ResetScope::AllButCaller => "reset_all",
            ResetScope::Everything => "reset_super",
        }
    }
}

pub async fn reset(
    state: &AppState,
    user: &AuthUser,
    scope: ResetScope,
) -> AppResult<ApiResponse<Ack>> {
    ensure_superadmin(user)?;

    let txn = state.orm.begin().await?;
    let orders = Orders::delete_many().exec(&txn).await?.rows_affected;
    MenuItems::delete_many().exec(&txn).await?;
    SignageItems::delete_many().exec(&txn).await?;
    Settings::delete_by_id(SIGNAGE_SETTINGS_KEY.to_string())
        .exec(&txn)
        .await?;
    let users = match scope {
        ResetScope::Data => 0,
        ResetScope::AllButCaller => {
            Users::delete_many()
                .filter(UserCol::Username.ne(user.username.as_str()))
                .exec(&txn)
                .await?
                .rows_affected
        }
        ResetScope::Everything => Users::delete_many().exec(&txn).await?.rows_affected,
    };
    txn.commit().await?;

    tracing::warn!(scope = scope.action(), by = %user.username, orders, users, "data reset");
    state.live.publish(OrderEvent::Cleared);

    audit::record(
        &state.pool,
        Some(&user.username),
        scope.action(),
        "all",
        serde_json::json!({ "orders": orders, "users": users }),
    )
    .await;

    Ok(ApiResponse::ack("Reset complete"))
}
