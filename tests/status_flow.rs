use cafe_orders_api::entity::orders::{OrderStatus, PaymentStatus};

#[test]
fn statuses_advance_one_step_and_stop_at_served() {
    assert_eq!(OrderStatus::Pending.next(), OrderStatus::Preparing);
    assert_eq!(OrderStatus::Preparing.next(), OrderStatus::Ready);
    assert_eq!(OrderStatus::Ready.next(), OrderStatus::Served);
    assert_eq!(OrderStatus::Served.next(), OrderStatus::Served);
}

#[test]
fn statuses_serialize_lowercase() {
    assert_eq!(OrderStatus::Pending.as_str(), "pending");
    assert_eq!(OrderStatus::Preparing.as_str(), "preparing");
    assert_eq!(OrderStatus::Ready.as_str(), "ready");
    assert_eq!(OrderStatus::Served.as_str(), "served");
    assert_eq!(PaymentStatus::Pending.as_str(), "pending");
    assert_eq!(PaymentStatus::Completed.as_str(), "completed");
}
