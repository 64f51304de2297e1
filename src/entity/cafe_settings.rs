use sea_orm::entity::prelude::*;

/// Singleton table. The `singleton` column is always true and carries a
/// unique constraint, so a second row can never be inserted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cafe_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub cafe_name: String,
    pub logo_url: Option<String>,
    pub singleton: bool,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
