use cafe_orders_api::entity::coupons::{DiscountType, Model as CouponModel};
use cafe_orders_api::services::coupon_service::{CouponEvaluation, evaluate, normalize_code};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

fn coupon(now: DateTime<Utc>) -> CouponModel {
    CouponModel {
        id: Uuid::new_v4(),
        code: "FLAT50".into(),
        discount_type: DiscountType::Fixed,
        discount_value: Decimal::new(5000, 2),
        min_order: Decimal::new(20000, 2),
        max_uses: 10,
        used_count: 0,
        is_active: true,
        expires_at: None,
        created_at: now.into(),
    }
}

#[test]
fn codes_are_trimmed_and_uppercased() {
    assert_eq!(normalize_code("  flat50 "), "FLAT50");
    assert_eq!(normalize_code("Save20"), "SAVE20");
}

#[test]
fn missing_and_inactive_coupons_look_the_same() {
    let now = Utc::now();
    let subtotal = Decimal::new(50000, 2);

    assert_eq!(evaluate(None, subtotal, now), CouponEvaluation::NotFound);

    let mut inactive = coupon(now);
    inactive.is_active = false;
    assert_eq!(
        evaluate(Some(&inactive), subtotal, now),
        CouponEvaluation::NotFound
    );
}

#[test]
fn exhausted_coupon_is_rejected() {
    let now = Utc::now();
    let mut used_up = coupon(now);
    used_up.used_count = used_up.max_uses;

    assert_eq!(
        evaluate(Some(&used_up), Decimal::new(50000, 2), now),
        CouponEvaluation::LimitReached
    );
}

#[test]
fn usage_limit_is_checked_before_expiry() {
    let now = Utc::now();
    let mut c = coupon(now);
    c.used_count = c.max_uses;
    c.expires_at = Some((now - Duration::hours(1)).into());

    assert_eq!(
        evaluate(Some(&c), Decimal::new(50000, 2), now),
        CouponEvaluation::LimitReached
    );
}

#[test]
fn expired_coupon_is_rejected_with_uses_left() {
    let now = Utc::now();
    let mut expired = coupon(now);
    expired.expires_at = Some((now - Duration::hours(1)).into());

    assert_eq!(
        evaluate(Some(&expired), Decimal::new(50000, 2), now),
        CouponEvaluation::Expired
    );
}

#[test]
fn expiry_boundary_is_inclusive() {
    let now = Utc::now();
    let mut c = coupon(now);
    c.expires_at = Some(now.into());

    assert!(matches!(
        evaluate(Some(&c), Decimal::new(50000, 2), now),
        CouponEvaluation::Eligible(_)
    ));
}

#[test]
fn below_minimum_reports_the_shortfall() {
    let now = Utc::now();
    let c = coupon(now);

    let evaluation = evaluate(Some(&c), Decimal::new(15000, 2), now);
    assert_eq!(
        evaluation,
        CouponEvaluation::BelowMinimum {
            amount_short: Decimal::new(5000, 2),
        }
    );
    assert_eq!(evaluation.verdict(), "below_minimum");
}

#[test]
fn minimum_order_boundary_is_eligible() {
    let now = Utc::now();
    let c = coupon(now);

    assert!(matches!(
        evaluate(Some(&c), c.min_order, now),
        CouponEvaluation::Eligible(_)
    ));
}

#[test]
fn verdicts_name_every_outcome() {
    let now = Utc::now();
    let c = coupon(now);

    assert_eq!(evaluate(Some(&c), c.min_order, now).verdict(), "eligible");
    assert_eq!(CouponEvaluation::NotFound.verdict(), "not_found");
    assert_eq!(CouponEvaluation::LimitReached.verdict(), "limit_reached");
    assert_eq!(CouponEvaluation::Expired.verdict(), "expired");
}
