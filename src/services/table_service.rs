use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::tables::{TableDto, TableList},
    entity::{
        cafe_tables::{
            ActiveModel as TableActive, Column as TableCol, Entity as CafeTables,
            Model as TableModel,
        },
        orders::{Column as OrderCol, Entity as Orders},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    routes::admin::{CreateTableRequest, UpdateTableRequest},
    state::AppState,
};

pub async fn list_tables(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<TableList>> {
    ensure_admin(user)?;
    let items = CafeTables::find()
        .order_by_asc(TableCol::TableNumber)
        .all(&state.orm)
        .await?
        .iter()
        .map(table_dto)
        .collect();

    Ok(ApiResponse::success(
        "Tables",
        TableList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_table(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTableRequest,
) -> AppResult<ApiResponse<TableDto>> {
    ensure_admin(user)?;

    if payload.table_number <= 0 {
        return Err(AppError::BadRequest(
            "table_number must be greater than 0".into(),
        ));
    }
    if payload.capacity <= 0 {
        return Err(AppError::BadRequest("capacity must be greater than 0".into()));
    }

    let taken = CafeTables::find()
        .filter(TableCol::TableNumber.eq(payload.table_number))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest("Table number already exists".into()));
    }

    let table = TableActive {
        id: Set(Uuid::new_v4()),
        table_number: Set(payload.table_number),
        capacity: Set(payload.capacity),
        is_available: Set(payload.is_available.unwrap_or(true)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "table_create",
        Some("cafe_tables"),
        Some(serde_json::json!({ "table_id": table.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Table created",
        table_dto(&table),
        Some(Meta::empty()),
    ))
}

pub async fn update_table(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateTableRequest,
) -> AppResult<ApiResponse<TableDto>> {
    ensure_admin(user)?;

    let existing = CafeTables::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(t) => t,
        None => return Err(AppError::NotFound),
    };

    let table_number = payload.table_number.unwrap_or(existing.table_number);
    if table_number <= 0 {
        return Err(AppError::BadRequest(
            "table_number must be greater than 0".into(),
        ));
    }
    if table_number != existing.table_number {
        let taken = CafeTables::find()
            .filter(TableCol::TableNumber.eq(table_number))
            .one(&state.orm)
            .await?;
        if taken.is_some() {
            return Err(AppError::BadRequest("Table number already exists".into()));
        }
    }
    let capacity = payload.capacity.unwrap_or(existing.capacity);
    if capacity <= 0 {
        return Err(AppError::BadRequest("capacity must be greater than 0".into()));
    }
    let is_available = payload.is_available.unwrap_or(existing.is_available);

    let mut active: TableActive = existing.into();
    active.table_number = Set(table_number);
    active.capacity = Set(capacity);
    active.is_available = Set(is_available);
    let table = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "table_update",
        Some("cafe_tables"),
        Some(serde_json::json!({ "table_id": table.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Table updated",
        table_dto(&table),
        Some(Meta::empty()),
    ))
}

pub async fn toggle_table(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<TableDto>> {
    ensure_admin(user)?;

    let existing = CafeTables::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(t) => t,
        None => return Err(AppError::NotFound),
    };

    let was_available = existing.is_available;
    let mut active: TableActive = existing.into();
    active.is_available = Set(!was_available);
    let table = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "table_toggle",
        Some("cafe_tables"),
        Some(serde_json::json!({ "table_id": table.id, "is_available": table.is_available })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Table updated",
        table_dto(&table),
        Some(Meta::empty()),
    ))
}

pub async fn delete_table(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let referenced = Orders::find()
        .filter(OrderCol::TableId.eq(id))
        .count(&state.orm)
        .await?;
    if referenced > 0 {
        return Err(AppError::BadRequest(
            "Table has orders, mark it unavailable instead".into(),
        ));
    }

    let result = CafeTables::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "table_delete",
        Some("cafe_tables"),
        Some(serde_json::json!({ "table_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Table deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) fn table_dto(model: &TableModel) -> TableDto {
    TableDto {
        id: model.id,
        table_number: model.table_number,
        capacity: model.capacity,
        is_available: model.is_available,
    }
}
