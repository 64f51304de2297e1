use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct TableDto {
    pub id: Uuid,
    pub table_number: i32,
    pub capacity: i32,
    pub is_available: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TableList {
    pub items: Vec<TableDto>,
}
