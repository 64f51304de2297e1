use cafe_orders_api::entity::coupons::DiscountType;
use cafe_orders_api::pricing;
use rust_decimal::Decimal;

fn rupees(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

#[test]
fn subtotal_multiplies_quantities() {
    let lines = [(rupees(12000), 1), (rupees(16000), 2)];
    assert_eq!(pricing::subtotal(&lines), rupees(44000));
}

#[test]
fn quote_without_coupon_adds_five_percent_tax() {
    let totals = pricing::quote(&[(rupees(20000), 1)], None);
    assert_eq!(totals.subtotal, rupees(20000));
    assert_eq!(totals.discount, Decimal::ZERO);
    assert_eq!(totals.tax, rupees(1000));
    assert_eq!(totals.total, rupees(21000));
}

#[test]
fn fixed_coupon_discounts_before_tax() {
    // 200 - 50 = 150, taxed at 5% -> 7.50
    let totals = pricing::quote(
        &[(rupees(20000), 1)],
        Some((&DiscountType::Fixed, rupees(5000))),
    );
    assert_eq!(totals.discount, rupees(5000));
    assert_eq!(totals.tax, rupees(750));
    assert_eq!(totals.total, rupees(15750));
}

#[test]
fn percent_coupon_discounts_before_tax() {
    // 20% of 200 = 40, taxed base 160 -> 8.00
    let totals = pricing::quote(
        &[(rupees(20000), 1)],
        Some((&DiscountType::Percent, rupees(2000))),
    );
    assert_eq!(totals.discount, rupees(4000));
    assert_eq!(totals.tax, rupees(800));
    assert_eq!(totals.total, rupees(16800));
}

#[test]
fn fixed_coupon_never_exceeds_subtotal() {
    let totals = pricing::quote(
        &[(rupees(20000), 1)],
        Some((&DiscountType::Fixed, rupees(50000))),
    );
    assert_eq!(totals.discount, rupees(20000));
    assert_eq!(totals.tax, Decimal::ZERO);
    assert_eq!(totals.total, Decimal::ZERO);
}

#[test]
fn minor_units_round_midpoints_away_from_zero() {
    assert_eq!(pricing::to_minor_units(rupees(15750)), Some(15750));
    assert_eq!(pricing::to_minor_units(Decimal::new(5, 3)), Some(1));
    assert_eq!(pricing::to_minor_units(Decimal::new(4, 3)), Some(0));
}

#[test]
fn minor_units_reject_amounts_out_of_range() {
    assert_eq!(pricing::to_minor_units(Decimal::new(i64::MAX, 0)), None);
}
