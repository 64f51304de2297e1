use cafe_orders_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        orders::{CreateOrderRequest, OrderData, OrderItemInput},
        payments::VerifyPaymentRequest,
    },
    entity::{
        Coupons, OrderItems, Orders,
        cafe_tables::ActiveModel as TableActive,
        categories::ActiveModel as CategoryActive,
        coupons::{ActiveModel as CouponActive, Column as CouponCol, DiscountType},
        menu_items::ActiveModel as MenuItemActive,
        order_items::Column as OrderItemCol,
        orders::{OrderStatus, PaymentStatus},
        profiles::ActiveModel as ProfileActive,
    },
    error::AppError,
    events::ChangeFeed,
    middleware::auth::AuthUser,
    razorpay::RazorpayClient,
    routes::params::{OrderListQuery, Pagination},
    services::{admin_service, order_service, payment_service},
    state::{AppState, SettingsCache},
};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    Statement,
};
use sha2::Sha256;
use uuid::Uuid;

const GATEWAY_SECRET: &str = "test_gateway_secret";

// Integration flow: customer places a counter order with a coupon, a bad
// declared total and an exhausted coupon both abort cleanly, two concurrent
// redemptions fight over the last use, a verified payment commits, and the
// admin advances, boards and deletes orders.
#[tokio::test]
async fn order_commit_payment_and_admin_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let customer = create_profile(&state, "customer", "customer@example.com").await?;
    let stranger = create_profile(&state, "customer", "stranger@example.com").await?;
    let admin = create_profile(&state, "admin", "admin@example.com").await?;

    // Seed a small menu, one table and one nearly-exhausted coupon.
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set("Coffee".into()),
        sort_order: Set(1),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let espresso = seed_menu_item(&state, category.id, "Espresso", 12000, true).await?;
    let cappuccino = seed_menu_item(&state, category.id, "Cappuccino", 16000, true).await?;
    let seasonal = seed_menu_item(&state, category.id, "Seasonal Special", 18000, false).await?;

    let table = TableActive {
        id: Set(Uuid::new_v4()),
        table_number: Set(1),
        capacity: Set(2),
        is_available: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let coupon = CouponActive {
        id: Set(Uuid::new_v4()),
        code: Set("FLAT50".into()),
        discount_type: Set(DiscountType::Fixed),
        discount_value: Set(Decimal::new(5000, 2)),
        min_order: Set(Decimal::new(10000, 2)),
        max_uses: Set(2),
        used_count: Set(0),
        is_active: Set(true),
        expires_at: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    // Counter order: totals come from the live menu, not the client.
    let mut feed = state.feed.subscribe();
    let placed = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            items: vec![
                OrderItemInput {
                    menu_item_id: cappuccino,
                    quantity: 2,
                },
                OrderItemInput {
                    menu_item_id: espresso,
                    quantity: 1,
                },
            ],
            table_id: table.id,
            coupon_id: Some(coupon.id),
        },
    )
    .await?;
    let placed = placed.data.expect("order payload");
    assert_eq!(placed.order.subtotal, Decimal::new(44000, 2));
    assert_eq!(placed.order.discount, Decimal::new(5000, 2));
    assert_eq!(placed.order.total, Decimal::new(40950, 2));
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.payment_status, PaymentStatus::Pending);
    assert!(placed.order.payment_id.is_none());
    assert!(placed.order.order_number.starts_with("ORD-"));
    assert_eq!(placed.items.len(), 2);

    let event = feed.try_recv()?;
    assert_eq!(event.resource, "orders");
    assert_eq!(event.action, "insert");
    assert_eq!(event.id, Some(placed.order.id));

    let used = coupon_used_count(&state, coupon.id).await?;
    assert_eq!(used, 1);

    // Owner sees the order; anyone else gets a 404.
    let mine = order_service::list_my_orders(&state, &customer).await?;
    assert_eq!(mine.data.expect("orders").items.len(), 1);
    let fetched = order_service::get_order(&state, &customer, placed.order.id).await?;
    assert_eq!(fetched.data.expect("order").order.id, placed.order.id);
    let not_theirs = order_service::get_order(&state, &stranger, placed.order.id).await;
    assert!(matches!(not_theirs, Err(AppError::NotFound)));

    // Bad carts are rejected before anything is written.
    let empty = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            items: vec![],
            table_id: table.id,
            coupon_id: None,
        },
    )
    .await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    let unavailable = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            items: vec![OrderItemInput {
                menu_item_id: seasonal,
                quantity: 1,
            }],
            table_id: table.id,
            coupon_id: None,
        },
    )
    .await;
    assert!(matches!(unavailable, Err(AppError::BadRequest(_))));

    let unknown_item = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            items: vec![OrderItemInput {
                menu_item_id: Uuid::new_v4(),
                quantity: 1,
            }],
            table_id: table.id,
            coupon_id: None,
        },
    )
    .await;
    assert!(matches!(unknown_item, Err(AppError::BadRequest(_))));
    assert_eq!(Orders::find().count(&state.orm).await?, 1);

    // An exhausted coupon aborts the whole commit, leaving no order behind.
    set_coupon_used_count(&state, coupon.id, 2).await?;
    let exhausted = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            items: vec![OrderItemInput {
                menu_item_id: espresso,
                quantity: 1,
            }],
            table_id: table.id,
            coupon_id: Some(coupon.id),
        },
    )
    .await;
    assert!(matches!(exhausted, Err(AppError::BadRequest(_))));
    assert_eq!(Orders::find().count(&state.orm).await?, 1);
    set_coupon_used_count(&state, coupon.id, 1).await?;

    // One use left, two concurrent redemptions: exactly one may win.
    let first = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            items: vec![OrderItemInput {
                menu_item_id: espresso,
                quantity: 1,
            }],
            table_id: table.id,
            coupon_id: Some(coupon.id),
        },
    );
    let second = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            items: vec![OrderItemInput {
                menu_item_id: espresso,
                quantity: 1,
            }],
            table_id: table.id,
            coupon_id: Some(coupon.id),
        },
    );
    let (first, second) = tokio::join!(first, second);
    assert!(
        first.is_ok() != second.is_ok(),
        "exactly one concurrent redemption must win"
    );
    let race_winner = match (first, second) {
        (Ok(resp), Err(_)) | (Err(_), Ok(resp)) => resp.data.expect("order payload").order.id,
        _ => unreachable!(),
    };
    assert_eq!(coupon_used_count(&state, coupon.id).await?, 2);
    assert_eq!(Orders::find().count(&state.orm).await?, 2);

    // Verified payment with drifted declared totals is rejected unwritten.
    let espresso_order = OrderData {
        items: vec![OrderItemInput {
            menu_item_id: espresso,
            quantity: 1,
        }],
        table_id: table.id,
        coupon_id: None,
        subtotal: Decimal::new(12000, 2),
        discount: Decimal::ZERO,
        total: Decimal::new(13600, 2),
    };
    let drifted = payment_service::verify_and_commit(
        &state,
        &customer,
        VerifyPaymentRequest {
            intent_id: "order_int_1".into(),
            payment_id: "pay_test_1".into(),
            signature: sign(GATEWAY_SECRET, "order_int_1", "pay_test_1"),
            order_data: espresso_order.clone(),
        },
    )
    .await;
    assert!(matches!(drifted, Err(AppError::BadRequest(_))));
    assert_eq!(Orders::find().count(&state.orm).await?, 2);

    // A bad signature fails closed regardless of the payload.
    let forged = payment_service::verify_and_commit(
        &state,
        &customer,
        VerifyPaymentRequest {
            intent_id: "order_int_1".into(),
            payment_id: "pay_test_1".into(),
            signature: sign("wrong_secret", "order_int_1", "pay_test_1"),
            order_data: OrderData {
                total: Decimal::new(12600, 2),
                ..espresso_order.clone()
            },
        },
    )
    .await;
    assert!(matches!(forged, Err(AppError::InvalidSignature)));
    assert_eq!(Orders::find().count(&state.orm).await?, 2);

    // Declared totals a paisa off are within tolerance; the server's own
    // numbers are what get stored.
    let paid = payment_service::verify_and_commit(
        &state,
        &customer,
        VerifyPaymentRequest {
            intent_id: "order_int_1".into(),
            payment_id: "pay_test_1".into(),
            signature: sign(GATEWAY_SECRET, "order_int_1", "pay_test_1"),
            order_data: OrderData {
                total: Decimal::new(12601, 2),
                ..espresso_order
            },
        },
    )
    .await?;
    assert!(paid.success);
    let paid_order = Orders::find_by_id(paid.order.id)
        .one(&state.orm)
        .await?
        .expect("paid order row");
    assert_eq!(paid_order.order_number, paid.order.order_number);
    assert_eq!(paid_order.payment_status, PaymentStatus::Completed);
    assert_eq!(paid_order.payment_id.as_deref(), Some("pay_test_1"));
    assert_eq!(paid_order.total, Decimal::new(12600, 2));

    // Admin advances the counter order one step at a time until it parks
    // at served.
    let advanced = order_service::advance_order_status(&state, &admin, placed.order.id).await?;
    assert_eq!(advanced.message, "Order status updated");
    assert_eq!(
        advanced.data.expect("order").status,
        OrderStatus::Preparing
    );
    order_service::advance_order_status(&state, &admin, placed.order.id).await?;
    order_service::advance_order_status(&state, &admin, placed.order.id).await?;
    let parked = order_service::advance_order_status(&state, &admin, placed.order.id).await?;
    assert_eq!(parked.message, "Order already served");
    assert_eq!(parked.data.expect("order").status, OrderStatus::Served);

    // Customers cannot advance.
    let denied = order_service::advance_order_status(&state, &customer, race_winner).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    // The board shows everything not yet served, oldest first.
    let board = order_service::kitchen_board(&state, &admin).await?;
    let board = board.data.expect("board");
    assert_eq!(board.items.len(), 2);
    assert!(board.items.iter().all(|o| o.table_number == 1));
    assert!(board.items.iter().all(|o| o.id != placed.order.id));
    assert_eq!(board.items[0].id, race_winner);

    let listed = order_service::list_all_orders(
        &state,
        &admin,
        OrderListQuery {
            pagination: Pagination {
                page: None,
                per_page: None,
            },
            status: Some("pending".into()),
            sort_order: None,
        },
    )
    .await?;
    assert_eq!(listed.meta.and_then(|m| m.total), Some(2));
    assert!(
        listed
            .data
            .expect("orders")
            .items
            .iter()
            .all(|o| o.status == OrderStatus::Pending)
    );

    // Only the completed payment counts toward revenue.
    let stats = admin_service::dashboard_stats(&state, &admin).await?;
    let stats = stats.data.expect("stats");
    assert_eq!(stats.total_orders, 3);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.served, 1);
    assert_eq!(stats.today_orders, 3);
    assert_eq!(stats.today_revenue, Decimal::new(12600, 2));

    let history = admin_service::customer_orders(&state, &admin, customer.user_id).await?;
    assert_eq!(history.data.expect("orders").items.len(), 3);

    // Deleting an order takes its items with it.
    order_service::delete_order(&state, &admin, paid.order.id).await?;
    assert!(Orders::find_by_id(paid.order.id).one(&state.orm).await?.is_none());
    let orphans = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(paid.order.id))
        .count(&state.orm)
        .await?;
    assert_eq!(orphans, 0);
    assert_eq!(Orders::find().count(&state.orm).await?, 2);

    // Every admin mutation and commit left an audit trail.
    let audit_rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_logs")
        .fetch_one(&state.pool)
        .await?;
    assert!(audit_rows.0 > 0, "expected audit rows to be written");

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, audit_logs, coupons, menu_items, categories, cafe_tables, cafe_settings, profiles RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState {
        pool,
        orm,
        gateway: RazorpayClient::new("rzp_test_key".into(), GATEWAY_SECRET.into()),
        feed: ChangeFeed::default(),
        settings: SettingsCache::default(),
    })
}

async fn create_profile(state: &AppState, role: &str, email: &str) -> anyhow::Result<AuthUser> {
    let profile = ProfileActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        full_name: Set(None),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: profile.id,
        email: profile.email,
        role: profile.role,
    })
}

async fn seed_menu_item(
    state: &AppState,
    category_id: Uuid,
    name: &str,
    price_minor: i64,
    available: bool,
) -> anyhow::Result<Uuid> {
    let item = MenuItemActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(category_id),
        name: Set(name.to_string()),
        description: Set(None),
        price: Set(Decimal::new(price_minor, 2)),
        image_url: Set(None),
        available: Set(available),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(item.id)
}

async fn coupon_used_count(state: &AppState, coupon_id: Uuid) -> anyhow::Result<i32> {
    let coupon = Coupons::find_by_id(coupon_id)
        .one(&state.orm)
        .await?
        .expect("coupon row");
    Ok(coupon.used_count)
}

async fn set_coupon_used_count(
    state: &AppState,
    coupon_id: Uuid,
    used_count: i32,
) -> anyhow::Result<()> {
    Coupons::update_many()
        .col_expr(CouponCol::UsedCount, Expr::value(used_count))
        .filter(CouponCol::Id.eq(coupon_id))
        .exec(&state.orm)
        .await?;
    Ok(())
}

fn sign(secret: &str, intent_id: &str, payment_id: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(format!("{intent_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
