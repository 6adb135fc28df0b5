use sea_orm::{
    ActiveModelTrait, EntityTrait, QueryOrder, Set, TransactionTrait, ActiveValue::NotSet,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        csv_import::{SIGNAGE_TEMPLATE_HEADER, parse_signage_csv},
        item_field::{SignageUpdate, parse_signage_update},
    },
    dto::{
        items::ImportSummary,
        signage::{SignageFeed, SignageList, UpdateSignageRequest},
    },
    entity::{
        settings::SIGNAGE_SETTINGS_KEY,
        signage_items::{ActiveModel, Column, Entity as SignageItems, Model as SignageModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{SignageItem, SignageSettings},
    response::{ApiResponse, Meta},
    services::settings_service::load_or_default,
    state::AppState,
};

async fn sorted_items(state: &AppState) -> AppResult<Vec<SignageItem>> {
    Ok(SignageItems::find()
        .order_by_asc(Column::SortOrder)
        .order_by_asc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(signage_from_entity)
        .collect())
}

/// Public playlist for the signage screen.
pub async fn signage_feed(state: &AppState) -> AppResult<ApiResponse<SignageFeed>> {
    let items = sorted_items(state).await?;
    let settings: SignageSettings = load_or_default(&state.orm, SIGNAGE_SETTINGS_KEY).await?;
    let total = items.len();
    Ok(ApiResponse::success(
        "Signage",
        SignageFeed { items, settings },
        Some(Meta::all(total)),
    ))
}

pub async fn signage_list(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<SignageList>> {
    ensure_admin(user)?;
    let items = sorted_items(state).await?;
    let total = items.len();
    Ok(ApiResponse::success(
        "Signage",
        SignageList { items },
        Some(Meta::all(total)),
    ))
}

pub async fn update_signage_item(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSignageRequest,
) -> AppResult<ApiResponse<SignageItem>> {
    ensure_admin(user)?;
    let update = parse_signage_update(payload.field.trim(), &payload.value)?;

    let existing = SignageItems::find_by_id(payload.id).one(&state.orm).await?;
    let existing = match existing {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    match update {
        SignageUpdate::Url(url) => active.url = Set(url),
        SignageUpdate::Duration(duration) => active.duration = Set(duration),
        SignageUpdate::Order(order) => active.sort_order = Set(order),
    }
    let item = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(&user.username),
        "signage_update",
        "signage_items",
        serde_json::json!({ "signage_id": item.id, "field": payload.field, "value": payload.value }),
    )
    .await;

    Ok(ApiResponse::success(
        "Signage updated",
        signage_from_entity(item),
        Some(Meta::empty()),
    ))
}

/// Replaces the playlist with the uploaded `url,duration,order` file.
pub async fn upload_signage_csv(
    state: &AppState,
    user: &AuthUser,
    bytes: &[u8],
) -> AppResult<ApiResponse<ImportSummary>> {
    ensure_admin(user)?;
    let records = parse_signage_csv(bytes)?;

    let txn = state.orm.begin().await?;
    SignageItems::delete_many().exec(&txn).await?;
    for record in &records {
        ActiveModel {
            id: Set(Uuid::new_v4()),
            url: Set(record.url.clone()),
            duration: Set(record.duration),
            sort_order: Set(record.order),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }
    txn.commit().await?;

    let imported = records.len();
    tracing::info!(imported, "signage replaced from csv");
    audit::record(
        &state.pool,
        Some(&user.username),
        "signage_upload",
        "signage_items",
        serde_json::json!({ "imported": imported }),
    )
    .await;

    Ok(ApiResponse::success(
        "Signage uploaded",
        ImportSummary { imported },
        Some(Meta::empty()),
    ))
}

pub fn template_download(user: &AuthUser) -> AppResult<&'static str> {
    ensure_admin(user)?;
    Ok(SIGNAGE_TEMPLATE_HEADER)
}

fn signage_from_entity(model: SignageModel) -> SignageItem {
    SignageItem {
        id: model.id,
        url: model.url,
        duration: model.duration,
        order: model.sort_order,
    }
}
