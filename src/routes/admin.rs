use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post, put},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::auth::SetupResult,
    dto::coupons::{CouponDto, CouponList},
    dto::menu::{CategoryDto, CategoryList, MenuItemDto, MenuItemList},
    dto::orders::{DashboardStats, MyOrdersList, OrderList, OrderView, OrderWithItems},
    dto::settings::{SettingsDto, UpdateSettingsRequest},
    dto::tables::{TableDto, TableList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::CustomerSummary,
    response::ApiResponse,
    routes::params::{OrderListQuery, Pagination},
    services::{
        admin_service, auth_service, coupon_service, menu_service, order_service,
        settings_service, table_service,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/setup", get(setup))
        .route("/dashboard", get(dashboard))
        .route("/customers", get(list_customers))
        .route("/customers/{id}/orders", get(customer_orders))
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}", get(get_order_admin))
        .route("/orders/{id}/advance", post(advance_order))
        .route("/orders/{id}", delete(delete_order))
        .route("/categories", get(list_categories))
        .route("/categories", post(create_category))
        .route("/categories/{id}", put(update_category))
        .route("/categories/{id}", delete(delete_category))
        .route("/menu-items", get(list_menu_items))
        .route("/menu-items", post(create_menu_item))
        .route("/menu-items/{id}", put(update_menu_item))
        .route("/menu-items/{id}/toggle", patch(toggle_menu_item))
        .route("/menu-items/{id}", delete(delete_menu_item))
        .route("/tables", get(list_tables))
        .route("/tables", post(create_table))
        .route("/tables/{id}", put(update_table))
        .route("/tables/{id}/toggle", patch(toggle_table))
        .route("/tables/{id}", delete(delete_table))
        .route("/coupons", get(list_coupons))
        .route("/coupons", post(create_coupon))
        .route("/coupons/{id}", put(update_coupon))
        .route("/coupons/{id}/toggle", patch(toggle_coupon))
        .route("/coupons/{id}", delete(delete_coupon))
        .route("/settings", put(update_settings))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTableRequest {
    pub table_number: i32,
    pub capacity: i32,
    pub is_available: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTableRequest {
    pub table_number: Option<i32>,
    pub capacity: Option<i32>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCouponRequest {
    pub code: String,
    /// "percent" or "fixed"
    pub discount_type: String,
    #[schema(value_type = f64)]
    pub discount_value: Decimal,
    #[schema(value_type = Option<f64>)]
    pub min_order: Option<Decimal>,
    pub max_uses: i32,
    pub is_active: Option<bool>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCouponRequest {
    pub code: Option<String>,
    pub discount_type: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub discount_value: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub min_order: Option<Decimal>,
    pub max_uses: Option<i32>,
    pub is_active: Option<bool>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[utoipa::path(
    get,
    path = "/api/admin/setup",
    responses(
        (status = 200, description = "Create, promote, or confirm the admin profile", body = ApiResponse<SetupResult>),
        (status = 401, description = "Unauthenticated"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn setup(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SetupResult>>> {
    let resp = auth_service::bootstrap_admin(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Order counts and today's revenue", body = ApiResponse<DashboardStats>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let resp = admin_service::dashboard_stats(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/customers",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Customers with order count and lifetime spend", body = ApiResponse<Vec<CustomerSummary>>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<Vec<CustomerSummary>>>> {
    let resp = admin_service::list_customers(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/admin/customers/{id}/orders", security(("bearer_auth" = [])), tag = "Admin")]
pub async fn customer_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MyOrdersList>>> {
    let resp = admin_service::customer_orders(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
    (status = 200, description = "All orders (admin only)", body = ApiResponse<OrderList>),
    (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(
    (
        "id" = Uuid, Path, description = "Order ID")
    ),
    responses(
    (status = 200, description = "Any order with items (admin only)", body = ApiResponse<OrderWithItems>),
    (status = 404, description = "Not Found", ),
    (status = 403, description = "Forbidden", ),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order_admin(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/advance",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Status moved one step forward; served stays served", body = ApiResponse<OrderView>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn advance_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let resp = order_service::advance_order_status(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/admin/orders/{id}", security(("bearer_auth" = [])), tag = "Admin")]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = order_service::delete_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/admin/categories", security(("bearer_auth" = [])), tag = "Admin")]
pub async fn list_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = menu_service::list_categories(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Category created", body = ApiResponse<CategoryDto>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<Json<ApiResponse<CategoryDto>>> {
    let resp = menu_service::create_category(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(put, path = "/api/admin/categories/{id}", request_body = UpdateCategoryRequest, security(("bearer_auth" = [])), tag = "Admin")]
pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> AppResult<Json<ApiResponse<CategoryDto>>> {
    let resp = menu_service::update_category(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category and its items removed together"),
        (status = 400, description = "Items appear in orders"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = menu_service::delete_category(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/admin/menu-items", security(("bearer_auth" = [])), tag = "Admin")]
pub async fn list_menu_items(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<MenuItemList>>> {
    let resp = menu_service::list_menu_items(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/menu-items",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item created", body = ApiResponse<MenuItemDto>),
        (status = 400, description = "Bad name, price, or category"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateMenuItemRequest>,
) -> AppResult<Json<ApiResponse<MenuItemDto>>> {
    let resp = menu_service::create_menu_item(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(put, path = "/api/admin/menu-items/{id}", request_body = UpdateMenuItemRequest, security(("bearer_auth" = [])), tag = "Admin")]
pub async fn update_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMenuItemRequest>,
) -> AppResult<Json<ApiResponse<MenuItemDto>>> {
    let resp = menu_service::update_menu_item(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(patch, path = "/api/admin/menu-items/{id}/toggle", security(("bearer_auth" = [])), tag = "Admin")]
pub async fn toggle_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MenuItemDto>>> {
    let resp = menu_service::toggle_menu_item(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/admin/menu-items/{id}", security(("bearer_auth" = [])), tag = "Admin")]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = menu_service::delete_menu_item(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/admin/tables", security(("bearer_auth" = [])), tag = "Admin")]
pub async fn list_tables(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<TableList>>> {
    let resp = table_service::list_tables(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/tables",
    request_body = CreateTableRequest,
    responses(
        (status = 200, description = "Table created", body = ApiResponse<TableDto>),
        (status = 400, description = "Bad number or capacity"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_table(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTableRequest>,
) -> AppResult<Json<ApiResponse<TableDto>>> {
    let resp = table_service::create_table(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(put, path = "/api/admin/tables/{id}", request_body = UpdateTableRequest, security(("bearer_auth" = [])), tag = "Admin")]
pub async fn update_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTableRequest>,
) -> AppResult<Json<ApiResponse<TableDto>>> {
    let resp = table_service::update_table(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(patch, path = "/api/admin/tables/{id}/toggle", security(("bearer_auth" = [])), tag = "Admin")]
pub async fn toggle_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TableDto>>> {
    let resp = table_service::toggle_table(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/admin/tables/{id}", security(("bearer_auth" = [])), tag = "Admin")]
pub async fn delete_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = table_service::delete_table(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/coupons",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Coupons, newest first", body = ApiResponse<CouponList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_coupons(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CouponList>>> {
    let resp = coupon_service::list_coupons(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/coupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 200, description = "Coupon created", body = ApiResponse<CouponDto>),
        (status = 400, description = "Duplicate code or invalid terms"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCouponRequest>,
) -> AppResult<Json<ApiResponse<CouponDto>>> {
    let resp = coupon_service::create_coupon(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(put, path = "/api/admin/coupons/{id}", request_body = UpdateCouponRequest, security(("bearer_auth" = [])), tag = "Admin")]
pub async fn update_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCouponRequest>,
) -> AppResult<Json<ApiResponse<CouponDto>>> {
    let resp = coupon_service::update_coupon(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(patch, path = "/api/admin/coupons/{id}/toggle", security(("bearer_auth" = [])), tag = "Admin")]
pub async fn toggle_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CouponDto>>> {
    let resp = coupon_service::toggle_coupon(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/admin/coupons/{id}", security(("bearer_auth" = [])), tag = "Admin")]
pub async fn delete_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = coupon_service::delete_coupon(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Singleton updated, created on first save", body = ApiResponse<SettingsDto>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateSettingsRequest>,
) -> AppResult<Json<ApiResponse<SettingsDto>>> {
    let resp = settings_service::update_settings(&state, &user, payload).await?;
    Ok(Json(resp))
}
