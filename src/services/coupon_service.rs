use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::coupons::{ApplyCouponRequest, CouponDto, CouponList, CouponVerdict},
    entity::coupons::{
        ActiveModel as CouponActive, Column as CouponCol, DiscountType, Entity as Coupons,
        Model as CouponModel,
    },
    entity::orders::{Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    routes::admin::{CreateCouponRequest, UpdateCouponRequest},
    routes::params::Pagination,
    state::AppState,
};

#[derive(Debug, Clone, PartialEq)]
pub enum CouponEvaluation {
    Eligible(CouponModel),
    NotFound,
    LimitReached,
    Expired,
    BelowMinimum { amount_short: Decimal },
}

impl CouponEvaluation {
    pub fn verdict(&self) -> &'static str {
        match self {
            CouponEvaluation::Eligible(_) => "eligible",
            CouponEvaluation::NotFound => "not_found",
            CouponEvaluation::LimitReached => "limit_reached",
            CouponEvaluation::Expired => "expired",
            CouponEvaluation::BelowMinimum { .. } => "below_minimum",
        }
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// The one redemption check every flow goes through. Checks run in a fixed
/// order and the first failure wins. Absent and inactive coupons are
/// indistinguishable to the caller.
pub fn evaluate(
    coupon: Option<&CouponModel>,
    subtotal: Decimal,
    now: DateTime<Utc>,
) -> CouponEvaluation {
    let coupon = match coupon {
        Some(c) if c.is_active => c,
        _ => return CouponEvaluation::NotFound,
    };
    if coupon.used_count >= coupon.max_uses {
        return CouponEvaluation::LimitReached;
    }
    if let Some(expires_at) = coupon.expires_at {
        if expires_at < now {
            return CouponEvaluation::Expired;
        }
    }
    if subtotal < coupon.min_order {
        return CouponEvaluation::BelowMinimum {
            amount_short: coupon.min_order - subtotal,
        };
    }
    CouponEvaluation::Eligible(coupon.clone())
}

/// Customer-facing check. Ineligibility is data, not an error: the verdict
/// goes back with HTTP 200 so the client can render the reason.
pub async fn apply_coupon(
    state: &AppState,
    payload: ApplyCouponRequest,
) -> AppResult<ApiResponse<CouponVerdict>> {
    let code = normalize_code(&payload.code);
    if code.is_empty() {
        return Err(AppError::BadRequest("Coupon code is required".into()));
    }

    let coupon = Coupons::find()
        .filter(CouponCol::Code.eq(code))
        .one(&state.orm)
        .await?;

    let evaluation = evaluate(coupon.as_ref(), payload.subtotal, Utc::now());
    let message = match &evaluation {
        CouponEvaluation::Eligible(_) => "Coupon applied",
        CouponEvaluation::NotFound => "Invalid coupon code",
        CouponEvaluation::LimitReached => "Coupon usage limit reached",
        CouponEvaluation::Expired => "Coupon has expired",
        CouponEvaluation::BelowMinimum { .. } => "Order is below the coupon minimum",
    };

    let verdict = CouponVerdict {
        verdict: evaluation.verdict().to_string(),
        coupon: match &evaluation {
            CouponEvaluation::Eligible(c) => Some(coupon_dto(c)),
            _ => None,
        },
        amount_short: match &evaluation {
            CouponEvaluation::BelowMinimum { amount_short } => Some(*amount_short),
            _ => None,
        },
    };

    Ok(ApiResponse::success(message, verdict, Some(Meta::empty())))
}

/// Commit-time check by id, inside the order transaction. Failures become
/// request errors so the transaction unwinds.
pub(crate) async fn require_eligible_by_id<C: ConnectionTrait>(
    conn: &C,
    coupon_id: Uuid,
    subtotal: Decimal,
) -> AppResult<CouponModel> {
    let coupon = Coupons::find_by_id(coupon_id).one(conn).await?;
    match evaluate(coupon.as_ref(), subtotal, Utc::now()) {
        CouponEvaluation::Eligible(c) => Ok(c),
        CouponEvaluation::NotFound => Err(AppError::BadRequest("Coupon not found".into())),
        CouponEvaluation::LimitReached => {
            Err(AppError::BadRequest("Coupon usage limit reached".into()))
        }
        CouponEvaluation::Expired => Err(AppError::BadRequest("Coupon has expired".into())),
        CouponEvaluation::BelowMinimum { amount_short } => Err(AppError::BadRequest(format!(
            "Order is below the coupon minimum by {amount_short}"
        ))),
    }
}

/// Conditional increment. The guard column comparison makes concurrent
/// redemptions of the last remaining use race safely: one wins, the rest
/// update zero rows and fail here.
pub(crate) async fn redeem<C: ConnectionTrait>(conn: &C, coupon_id: Uuid) -> AppResult<()> {
    let result = Coupons::update_many()
        .col_expr(
            CouponCol::UsedCount,
            Expr::col(CouponCol::UsedCount).add(1),
        )
        .filter(CouponCol::Id.eq(coupon_id))
        .filter(Expr::col(CouponCol::UsedCount).lt(Expr::col(CouponCol::MaxUses)))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::BadRequest("Coupon usage limit reached".into()));
    }
    Ok(())
}

pub async fn list_coupons(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CouponList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Coupons::find().order_by_desc(CouponCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .iter()
        .map(coupon_dto)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Coupons", CouponList { items }, Some(meta)))
}

pub async fn create_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCouponRequest,
) -> AppResult<ApiResponse<CouponDto>> {
    ensure_admin(user)?;

    let code = normalize_code(&payload.code);
    if code.is_empty() {
        return Err(AppError::BadRequest("Coupon code is required".into()));
    }

    let discount_type = DiscountType::from_code(&payload.discount_type)
        .ok_or_else(|| AppError::BadRequest("discount_type must be percent or fixed".into()))?;
    let min_order = payload.min_order.unwrap_or(Decimal::ZERO);
    validate_terms(&discount_type, payload.discount_value, min_order, payload.max_uses)?;

    let exists = Coupons::find()
        .filter(CouponCol::Code.eq(code.clone()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::BadRequest("Coupon code already exists".into()));
    }

    let coupon = CouponActive {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        discount_type: Set(discount_type),
        discount_value: Set(payload.discount_value),
        min_order: Set(min_order),
        max_uses: Set(payload.max_uses),
        used_count: Set(0),
        is_active: Set(payload.is_active.unwrap_or(true)),
        expires_at: Set(payload.expires_at.map(Into::into)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "coupon_create",
        Some("coupons"),
        Some(serde_json::json!({ "coupon_id": coupon.id, "code": coupon.code })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Coupon created",
        coupon_dto(&coupon),
        Some(Meta::empty()),
    ))
}

pub async fn update_coupon(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCouponRequest,
) -> AppResult<ApiResponse<CouponDto>> {
    ensure_admin(user)?;

    let existing = Coupons::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    let code = match payload.code {
        Some(raw) => {
            let code = normalize_code(&raw);
            if code.is_empty() {
                return Err(AppError::BadRequest("Coupon code is required".into()));
            }
            if code != existing.code {
                let clash = Coupons::find()
                    .filter(CouponCol::Code.eq(code.clone()))
                    .one(&state.orm)
                    .await?;
                if clash.is_some() {
                    return Err(AppError::BadRequest("Coupon code already exists".into()));
                }
            }
            code
        }
        None => existing.code.clone(),
    };

    let discount_type = match payload.discount_type.as_deref() {
        Some(raw) => DiscountType::from_code(raw)
            .ok_or_else(|| AppError::BadRequest("discount_type must be percent or fixed".into()))?,
        None => existing.discount_type.clone(),
    };
    let discount_value = payload.discount_value.unwrap_or(existing.discount_value);
    let min_order = payload.min_order.unwrap_or(existing.min_order);
    let max_uses = payload.max_uses.unwrap_or(existing.max_uses);
    validate_terms(&discount_type, discount_value, min_order, max_uses)?;
    if max_uses < existing.used_count {
        return Err(AppError::BadRequest(
            "max_uses cannot be below the recorded usage".into(),
        ));
    }

    let expires_at = match payload.expires_at {
        Some(value) => Some(value.into()),
        None => existing.expires_at,
    };
    let is_active = payload.is_active.unwrap_or(existing.is_active);

    let mut active: CouponActive = existing.into();
    active.code = Set(code);
    active.discount_type = Set(discount_type);
    active.discount_value = Set(discount_value);
    active.min_order = Set(min_order);
    active.max_uses = Set(max_uses);
    active.is_active = Set(is_active);
    active.expires_at = Set(expires_at);
    let coupon = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "coupon_update",
        Some("coupons"),
        Some(serde_json::json!({ "coupon_id": coupon.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Coupon updated",
        coupon_dto(&coupon),
        Some(Meta::empty()),
    ))
}

pub async fn toggle_coupon(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<CouponDto>> {
    ensure_admin(user)?;

    let existing = Coupons::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    let was_active = existing.is_active;
    let mut active: CouponActive = existing.into();
    active.is_active = Set(!was_active);
    let coupon = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "coupon_toggle",
        Some("coupons"),
        Some(serde_json::json!({ "coupon_id": coupon.id, "is_active": coupon.is_active })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Coupon updated",
        coupon_dto(&coupon),
        Some(Meta::empty()),
    ))
}

pub async fn delete_coupon(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let referenced = Orders::find()
        .filter(OrderCol::CouponId.eq(id))
        .count(&state.orm)
        .await?;
    if referenced > 0 {
        return Err(AppError::BadRequest(
            "Coupon was used by orders, deactivate it instead".into(),
        ));
    }

    let result = Coupons::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "coupon_delete",
        Some("coupons"),
        Some(serde_json::json!({ "coupon_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Coupon deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn validate_terms(
    discount_type: &DiscountType,
    discount_value: Decimal,
    min_order: Decimal,
    max_uses: i32,
) -> Result<(), AppError> {
    if discount_value <= Decimal::ZERO {
        return Err(AppError::BadRequest(
            "discount_value must be greater than 0".into(),
        ));
    }
    if *discount_type == DiscountType::Percent && discount_value > Decimal::from(100) {
        return Err(AppError::BadRequest(
            "percent discount cannot exceed 100".into(),
        ));
    }
    if min_order < Decimal::ZERO {
        return Err(AppError::BadRequest("min_order cannot be negative".into()));
    }
    if max_uses <= 0 {
        return Err(AppError::BadRequest(
            "max_uses must be greater than 0".into(),
        ));
    }
    Ok(())
}

pub(crate) fn coupon_dto(model: &CouponModel) -> CouponDto {
    CouponDto {
        id: model.id,
        code: model.code.clone(),
        discount_type: model.discount_type.clone(),
        discount_value: model.discount_value,
        min_order: model.min_order,
        max_uses: model.max_uses,
        used_count: model.used_count,
        is_active: model.is_active,
        expires_at: model.expires_at.map(|dt| dt.with_timezone(&Utc)),
    }
}
