use std::collections::BTreeSet;

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ConnectionTrait, EntityTrait, QueryOrder, Set,
    TransactionTrait, sea_query::OnConflict,
};
use serde_json::Value;

use crate::{
    audit,
    domain::{
        csv_import::{MENU_TEMPLATE_HEADER, MenuItemRecord, parse_menu_csv},
        item_field::{ItemUpdate, parse_item_update},
    },
    dto::items::{ImportSummary, ItemList, MenuPage, UpdateItemRequest},
    entity::menu_items::{ActiveModel, Column, Entity as MenuItems, Model as MenuItemModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::MenuItem,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn menu_page(state: &AppState) -> AppResult<ApiResponse<MenuPage>> {
    let items = all_items(&state.orm).await?;
    let categories = items
        .iter()
        .map(|i| i.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let total = items.len();
    Ok(ApiResponse::success(
        "Menu",
        MenuPage { items, categories },
        Some(Meta::all(total)),
    ))
}

pub async fn list_items(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ItemList>> {
    ensure_admin(user)?;
    let items = all_items(&state.orm).await?;
    let total = items.len();
    Ok(ApiResponse::success(
        "Items",
        ItemList { items },
        Some(Meta::all(total)),
    ))
}

pub async fn all_items<C: ConnectionTrait>(conn: &C) -> AppResult<Vec<MenuItem>> {
    Ok(MenuItems::find()
        .order_by_asc(Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(item_from_entity)
        .collect())
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_admin(user)?;
    if payload.id.trim().is_empty() || payload.field.trim().is_empty() {
        return Err(AppError::bad_request("Missing data"));
    }
    let update = parse_item_update(payload.field.trim(), &payload.value)?;

    let existing = MenuItems::find_by_id(payload.id.clone())
        .one(&state.orm)
        .await?;
    let existing = match existing {
        Some(item) => item,
        None => return Err(AppError::NotFound),
    };
    if update == ItemUpdate::IsSet(true) && !existing.set_count.is_some_and(|n| n > 0) {
        return Err(AppError::bad_request(format!(
            "Set a setCount on {} before marking it as a set",
            existing.name
        )));
    }

    let mut active: ActiveModel = existing.into();
    match update {
        ItemUpdate::Name(name) => active.name = Set(name),
        ItemUpdate::Price(price) => active.price = Set(price),
        ItemUpdate::Category(category) => active.category = Set(category),
        ItemUpdate::Description(description) => active.description = Set(description),
        ItemUpdate::ImageUrl(url) => active.image_url = Set(url),
        ItemUpdate::SoldOut(sold_out) => active.is_sold_out = Set(sold_out),
        ItemUpdate::Allergens(list) => active.allergens = Set(string_list(list)),
        ItemUpdate::IsSet(is_set) => active.is_set = Set(is_set),
        ItemUpdate::SetCount(count) => {
            active.set_count = Set(count);
            active.is_set = Set(count.is_some());
        }
        ItemUpdate::SetItems(list) => active.set_items = Set(string_list(list)),
    }
    let item = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(&user.username),
        "item_update",
        "menu_items",
        serde_json::json!({ "item_id": item.id, "field": payload.field, "value": payload.value }),
    )
    .await;

    Ok(ApiResponse::success(
        "Item updated",
        item_from_entity(item),
        Some(Meta::empty()),
    ))
}

/// Replaces the whole menu with the uploaded CSV. The file is parsed and
/// validated before anything is deleted.
pub async fn upload_csv(
    state: &AppState,
    user: &AuthUser,
    bytes: &[u8],
) -> AppResult<ApiResponse<ImportSummary>> {
    ensure_admin(user)?;
    let records = parse_menu_csv(bytes)?;

    let txn = state.orm.begin().await?;
    MenuItems::delete_many().exec(&txn).await?;
    let imported = upsert_records(&txn, &records).await?;
    txn.commit().await?;

    tracing::info!(imported, "menu replaced from csv");
    audit::record(
        &state.pool,
        Some(&user.username),
        "menu_upload",
        "menu_items",
        serde_json::json!({ "imported": imported }),
    )
    .await;

    Ok(ApiResponse::success(
        "Menu uploaded",
        ImportSummary { imported },
        Some(Meta::empty()),
    ))
}

/// Inserts or overwrites items keyed by `ItemID`, leaving other items alone.
pub async fn upsert_records<C: ConnectionTrait>(
    conn: &C,
    records: &[MenuItemRecord],
) -> AppResult<usize> {
    for record in records {
        MenuItems::insert(active_from_record(record))
            .on_conflict(
                OnConflict::column(Column::Id)
                    .update_columns([
                        Column::Name,
                        Column::Price,
                        Column::Category,
                        Column::Description,
                        Column::ImageUrl,
                        Column::Allergens,
                        Column::IsSoldOut,
                        Column::IsSet,
                        Column::SetCount,
                        Column::SetItems,
                    ])
                    .to_owned(),
            )
            .exec(conn)
            .await?;
    }
    Ok(records.len())
}

pub fn template_csv() -> &'static str {
    MENU_TEMPLATE_HEADER
}

pub fn template_download(user: &AuthUser) -> AppResult<&'static str> {
    ensure_admin(user)?;
    Ok(template_csv())
}

fn active_from_record(record: &MenuItemRecord) -> ActiveModel {
    ActiveModel {
        id: Set(record.id.clone()),
        name: Set(record.name.clone()),
        price: Set(record.price),
        category: Set(record.category.clone()),
        description: Set(record.description.clone()),
        image_url: Set(record.image_url.clone()),
        allergens: Set(string_list(record.allergens.clone())),
        is_sold_out: Set(record.is_sold_out),
        is_set: Set(record.is_set()),
        set_count: Set(record.set_count),
        set_items: Set(string_list(record.set_items.clone())),
        created_at: NotSet,
    }
}

fn string_list(list: Vec<String>) -> Value {
    Value::Array(list.into_iter().map(Value::String).collect())
}

fn json_strings(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub fn item_from_entity(model: MenuItemModel) -> MenuItem {
    MenuItem {
        id: model.id,
        name: model.name,
        price: model.price,
        category: model.category,
        description: model.description,
        image_url: model.image_url,
        allergens: json_strings(model.allergens),
        is_sold_out: model.is_sold_out,
        is_set: model.is_set,
        set_count: model.set_count,
        set_items: json_strings(model.set_items),
    }
}
