use axum::{Json, Router, extract::State};

use crate::{
    dto::menu::{CategoryDto, MenuData, MenuItemDto},
    error::AppResult,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", axum::routing::get(get_menu))
}

#[utoipa::path(
    get,
    path = "/api/menu",
    responses(
        (status = 200, description = "Customer menu", body = ApiResponse<MenuData>)
    ),
    tag = "Menu"
)]
pub async fn get_menu(State(state): State<AppState>) -> AppResult<Json<ApiResponse<MenuData>>> {
    let categories = sqlx::query_as::<_, CategoryDto>(
        "SELECT id, name, sort_order FROM categories ORDER BY sort_order, name",
    )
    .fetch_all(&state.pool)
    .await?;

    let items = sqlx::query_as::<_, MenuItemDto>(
        "SELECT id, category_id, name, description, price, image_url, available
         FROM menu_items WHERE available ORDER BY name",
    )
    .fetch_all(&state.pool)
    .await?;

    let data = MenuData { categories, items };
    Ok(Json(ApiResponse::success("Menu", data, Some(Meta::empty()))))
}
