use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, EntityTrait, sea_query::OnConflict,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
    audit,
    domain::permissions::RolePermissions,
    entity::settings::{
        self, ActiveModel as SettingActive, Entity as Settings, ROLE_ACCESS_KEY,
        STORE_SETTINGS_KEY,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_superadmin},
    response::{Ack, ApiResponse, Meta},
    state::AppState,
};

pub async fn load_value<C: ConnectionTrait>(conn: &C, key: &str) -> AppResult<Option<Value>> {
    Ok(Settings::find_by_id(key.to_string())
        .one(conn)
        .await?
        .map(|m| m.value))
}

/// Loads a typed settings document, falling back to `T::default()` when it is
/// missing or no longer matches the expected shape.
pub async fn load_or_default<C, T>(conn: &C, key: &str) -> AppResult<T>
where
    C: ConnectionTrait,
    T: DeserializeOwned + Default,
{
    match load_value(conn, key).await? {
        Some(value) => Ok(serde_json::from_value(value).unwrap_or_else(|err| {
            tracing::warn!(key, error = %err, "stored settings are malformed, using defaults");
            T::default()
        })),
        None => Ok(T::default()),
    }
}

pub async fn store_value<C: ConnectionTrait>(conn: &C, key: &str, value: Value) -> AppResult<()> {
    let active = SettingActive {
        key: Set(key.to_string()),
        value: Set(value),
        updated_at: Set(Utc::now().into()),
    };
    Settings::insert(active)
        .on_conflict(
            OnConflict::column(settings::Column::Key)
                .update_columns([settings::Column::Value, settings::Column::UpdatedAt])
                .to_owned(),
        )
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn store_typed<C: ConnectionTrait, T: Serialize>(
    conn: &C,
    key: &str,
    value: &T,
) -> AppResult<()> {
    let value = serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))?;
    store_value(conn, key, value).await
}

pub async fn load_permissions(state: &AppState) -> AppResult<RolePermissions> {
    load_or_default(&state.orm, ROLE_ACCESS_KEY).await
}

pub async fn get_permissions(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<RolePermissions>> {
    ensure_superadmin(user)?;
    let permissions = load_permissions(state).await?;
    Ok(ApiResponse::success(
        "Permissions",
        permissions,
        Some(Meta::empty()),
    ))
}

pub async fn update_permissions(
    state: &AppState,
    user: &AuthUser,
    permissions: RolePermissions,
) -> AppResult<ApiResponse<Ack>> {
    ensure_superadmin(user)?;
    store_typed(&state.orm, ROLE_ACCESS_KEY, &permissions).await?;

    audit::record(
        &state.pool,
        Some(&user.username),
        "permissions_update",
        "settings",
        serde_json::to_value(&permissions).unwrap_or(Value::Null),
    )
    .await;

    Ok(ApiResponse::ack("Permissions updated"))
}

pub async fn get_store_settings(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Map<String, Value>>> {
    ensure_admin(user)?;
    let settings = load_store_settings(state).await?;
    Ok(ApiResponse::success(
        "Store settings",
        settings,
        Some(Meta::empty()),
    ))
}

/// Store settings are a free-form object shown on every page (shop name,
/// notices and so on). Unset means an empty object.
pub async fn load_store_settings(state: &AppState) -> AppResult<Map<String, Value>> {
    match load_value(&state.orm, STORE_SETTINGS_KEY).await? {
        Some(Value::Object(map)) => Ok(map),
        _ => Ok(Map::new()),
    }
}

pub async fn update_store_settings(
    state: &AppState,
    user: &AuthUser,
    patch: Value,
) -> AppResult<ApiResponse<Map<String, Value>>> {
    ensure_admin(user)?;
    let Value::Object(patch) = patch else {
        return Err(AppError::bad_request("Store settings must be a JSON object"));
    };

    let mut settings = load_store_settings(state).await?;
    merge_settings(&mut settings, patch);
    store_value(&state.orm, STORE_SETTINGS_KEY, Value::Object(settings.clone())).await?;

    audit::record(
        &state.pool,
        Some(&user.username),
        "store_settings_update",
        "settings",
        serde_json::json!({ "keys": settings.keys().collect::<Vec<_>>() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Store settings updated",
        settings,
        Some(Meta::empty()),
    ))
}

/// Shallow merge: top-level keys in `patch` replace existing ones.
pub fn merge_settings(settings: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        settings.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_keeps_untouched_keys() {
        let mut settings = json!({"storeName": "3年A組", "notice": "本日は晴天"})
            .as_object()
            .cloned()
            .unwrap();
        let patch = json!({"notice": "売り切れ間近"}).as_object().cloned().unwrap();
        merge_settings(&mut settings, patch);
        assert_eq!(settings["storeName"], "3年A組");
        assert_eq!(settings["notice"], "売り切れ間近");
    }
}
