use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsDto {
    pub cafe_name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub cafe_name: Option<String>,
    pub logo_url: Option<String>,
}
