use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::coupons::{ApplyCouponRequest, CouponVerdict},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::coupon_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/apply", post(apply_coupon))
}

#[utoipa::path(
    post,
    path = "/api/coupons/apply",
    request_body = ApplyCouponRequest,
    responses(
        (status = 200, description = "Validator verdict, eligible or not", body = ApiResponse<CouponVerdict>),
        (status = 400, description = "Missing coupon code"),
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn apply_coupon(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<ApplyCouponRequest>,
) -> AppResult<Json<ApiResponse<CouponVerdict>>> {
    let resp = coupon_service::apply_coupon(&state, payload).await?;
    Ok(Json(resp))
}
