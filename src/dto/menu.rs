use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct CategoryDto {
    pub id: Uuid,
    pub name: String,
    pub sort_order: i32,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct MenuItemDto {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub available: bool,
}

/// Customer menu payload. Categories come pre-sorted; clients group the
/// items under them.
#[derive(Debug, Serialize, ToSchema)]
pub struct MenuData {
    pub categories: Vec<CategoryDto>,
    pub items: Vec<MenuItemDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<CategoryDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuItemList {
    pub items: Vec<MenuItemDto>,
}
