use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::entity::coupons::DiscountType;

/// Flat 5% GST-style rate applied after discount.
pub const TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

const MINOR_UNITS_PER_RUPEE: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

pub fn subtotal(lines: &[(Decimal, i32)]) -> Decimal {
    lines
        .iter()
        .map(|(unit_price, quantity)| *unit_price * Decimal::from(*quantity))
        .sum()
}

/// Percent discounts are taken as-is, even above 100%. Fixed discounts are
/// clamped so they never exceed the subtotal.
pub fn discount(subtotal: Decimal, discount_type: &DiscountType, value: Decimal) -> Decimal {
    match discount_type {
        DiscountType::Percent => subtotal * value / Decimal::from(100),
        DiscountType::Fixed => value.min(subtotal),
    }
}

pub fn tax(subtotal: Decimal, discount: Decimal) -> Decimal {
    (subtotal - discount) * TAX_RATE
}

/// Quote a cart: subtotal, coupon discount, tax on the discounted base, total.
pub fn quote(lines: &[(Decimal, i32)], coupon: Option<(&DiscountType, Decimal)>) -> Totals {
    let subtotal = subtotal(lines);
    let discount = match coupon {
        Some((discount_type, value)) => self::discount(subtotal, discount_type, value),
        None => Decimal::ZERO,
    };
    let tax = tax(subtotal, discount);
    Totals {
        subtotal,
        discount,
        tax,
        total: subtotal - discount + tax,
    }
}

/// Rupees to paise, rounding halves away from zero.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * MINOR_UNITS_PER_RUPEE)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}
