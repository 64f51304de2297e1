use axum::{Json, Router, extract::State};

use crate::{
    dto::tables::{TableDto, TableList},
    error::AppResult,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", axum::routing::get(list_tables))
}

#[utoipa::path(
    get,
    path = "/api/tables",
    responses(
        (status = 200, description = "Tables, available first", body = ApiResponse<TableList>)
    ),
    tag = "Tables"
)]
pub async fn list_tables(State(state): State<AppState>) -> AppResult<Json<ApiResponse<TableList>>> {
    let items = sqlx::query_as::<_, TableDto>(
        "SELECT id, table_number, capacity, is_available
         FROM cafe_tables ORDER BY is_available DESC, table_number",
    )
    .fetch_all(&state.pool)
    .await?;

    let data = TableList { items };
    Ok(Json(ApiResponse::success("Tables", data, Some(Meta::empty()))))
}
