use axum::{Json, Router, extract::State};

use crate::{
    dto::settings::SettingsDto,
    error::AppResult,
    response::ApiResponse,
    services::settings_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", axum::routing::get(get_settings))
}

#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Cafe settings or defaults", body = ApiResponse<SettingsDto>)
    ),
    tag = "Settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<SettingsDto>>> {
    let resp = settings_service::get_settings(&state).await?;
    Ok(Json(resp))
}
