use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::menu::{CategoryDto, CategoryList, MenuItemDto, MenuItemList},
    entity::{
        categories::{
            ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories,
            Model as CategoryModel,
        },
        menu_items::{
            ActiveModel as MenuItemActive, Column as MenuItemCol, Entity as MenuItems,
            Model as MenuItemModel,
        },
        order_items::{Column as OrderItemCol, Entity as OrderItems},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    routes::admin::{
        CreateCategoryRequest, CreateMenuItemRequest, UpdateCategoryRequest, UpdateMenuItemRequest,
    },
    state::AppState,
};

pub async fn list_categories(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CategoryList>> {
    ensure_admin(user)?;
    let items = Categories::find()
        .order_by_asc(CategoryCol::SortOrder)
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .iter()
        .map(category_dto)
        .collect();

    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<CategoryDto>> {
    ensure_admin(user)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Category name is required".into()));
    }

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        sort_order: Set(payload.sort_order.unwrap_or(0)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "category_create",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Category created",
        category_dto(&category),
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<CategoryDto>> {
    ensure_admin(user)?;

    let existing = Categories::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    let name = match payload.name {
        Some(raw) => {
            let name = raw.trim().to_string();
            if name.is_empty() {
                return Err(AppError::BadRequest("Category name is required".into()));
            }
            name
        }
        None => existing.name.clone(),
    };
    let sort_order = payload.sort_order.unwrap_or(existing.sort_order);

    let mut active: CategoryActive = existing.into();
    active.name = Set(name);
    active.sort_order = Set(sort_order);
    let category = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "category_update",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Category updated",
        category_dto(&category),
        Some(Meta::empty()),
    ))
}

/// Removes a category and its items in one transaction. Items that appear in
/// past orders block the whole delete, so order history keeps its joins.
pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let category = Categories::find_by_id(id).one(&txn).await?;
    if category.is_none() {
        return Err(AppError::NotFound);
    }

    let item_ids: Vec<Uuid> = MenuItems::find()
        .filter(MenuItemCol::CategoryId.eq(id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|item| item.id)
        .collect();

    if !item_ids.is_empty() {
        let referenced = OrderItems::find()
            .filter(OrderItemCol::MenuItemId.is_in(item_ids.clone()))
            .count(&txn)
            .await?;
        if referenced > 0 {
            return Err(AppError::BadRequest(
                "Category has items that appear in orders, mark them unavailable instead".into(),
            ));
        }

        MenuItems::delete_many()
            .filter(MenuItemCol::CategoryId.eq(id))
            .exec(&txn)
            .await?;
    }

    Categories::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "category_delete",
        Some("categories"),
        Some(serde_json::json!({ "category_id": id, "items_removed": item_ids.len() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Category deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_menu_items(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<MenuItemList>> {
    ensure_admin(user)?;
    let items = MenuItems::find()
        .order_by_asc(MenuItemCol::Name)
        .all(&state.orm)
        .await?
        .iter()
        .map(menu_item_dto)
        .collect();

    Ok(ApiResponse::success(
        "Menu items",
        MenuItemList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_menu_item(
    state: &AppState,
    user: &AuthUser,
    payload: CreateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItemDto>> {
    ensure_admin(user)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Item name is required".into()));
    }
    if payload.price <= rust_decimal::Decimal::ZERO {
        return Err(AppError::BadRequest("price must be greater than 0".into()));
    }

    let category = Categories::find_by_id(payload.category_id)
        .one(&state.orm)
        .await?;
    if category.is_none() {
        return Err(AppError::BadRequest("Category not found".into()));
    }

    let item = MenuItemActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(payload.category_id),
        name: Set(name),
        description: Set(payload.description),
        price: Set(payload.price),
        image_url: Set(payload.image_url),
        available: Set(payload.available.unwrap_or(true)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "menu_item_create",
        Some("menu_items"),
        Some(serde_json::json!({ "menu_item_id": item.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Menu item created",
        menu_item_dto(&item),
        Some(Meta::empty()),
    ))
}

pub async fn update_menu_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItemDto>> {
    ensure_admin(user)?;

    let existing = MenuItems::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };

    let name = match payload.name {
        Some(raw) => {
            let name = raw.trim().to_string();
            if name.is_empty() {
                return Err(AppError::BadRequest("Item name is required".into()));
            }
            name
        }
        None => existing.name.clone(),
    };
    let price = payload.price.unwrap_or(existing.price);
    if price <= rust_decimal::Decimal::ZERO {
        return Err(AppError::BadRequest("price must be greater than 0".into()));
    }
    let category_id = payload.category_id.unwrap_or(existing.category_id);
    if category_id != existing.category_id {
        let category = Categories::find_by_id(category_id).one(&state.orm).await?;
        if category.is_none() {
            return Err(AppError::BadRequest("Category not found".into()));
        }
    }
    let description = payload.description.or(existing.description.clone());
    let image_url = payload.image_url.or(existing.image_url.clone());
    let available = payload.available.unwrap_or(existing.available);

    let mut active: MenuItemActive = existing.into();
    active.category_id = Set(category_id);
    active.name = Set(name);
    active.description = Set(description);
    active.price = Set(price);
    active.image_url = Set(image_url);
    active.available = Set(available);
    let item = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "menu_item_update",
        Some("menu_items"),
        Some(serde_json::json!({ "menu_item_id": item.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Menu item updated",
        menu_item_dto(&item),
        Some(Meta::empty()),
    ))
}

pub async fn toggle_menu_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<MenuItemDto>> {
    ensure_admin(user)?;

    let existing = MenuItems::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };

    let was_available = existing.available;
    let mut active: MenuItemActive = existing.into();
    active.available = Set(!was_available);
    let item = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "menu_item_toggle",
        Some("menu_items"),
        Some(serde_json::json!({ "menu_item_id": item.id, "available": item.available })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Menu item updated",
        menu_item_dto(&item),
        Some(Meta::empty()),
    ))
}

pub async fn delete_menu_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let referenced = OrderItems::find()
        .filter(OrderItemCol::MenuItemId.eq(id))
        .count(&state.orm)
        .await?;
    if referenced > 0 {
        return Err(AppError::BadRequest(
            "Menu item appears in orders, mark it unavailable instead".into(),
        ));
    }

    let result = MenuItems::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "menu_item_delete",
        Some("menu_items"),
        Some(serde_json::json!({ "menu_item_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Menu item deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) fn category_dto(model: &CategoryModel) -> CategoryDto {
    CategoryDto {
        id: model.id,
        name: model.name.clone(),
        sort_order: model.sort_order,
    }
}

pub(crate) fn menu_item_dto(model: &MenuItemModel) -> MenuItemDto {
    MenuItemDto {
        id: model.id,
        category_id: model.category_id,
        name: model.name.clone(),
        description: model.description.clone(),
        price: model.price,
        image_url: model.image_url.clone(),
        available: model.available,
    }
}
