use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use cafe_orders_api::{config::AppConfig, db::create_pool};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_profile(&pool, "admin@cafe.local", "admin123", "admin").await?;
    let customer_id = ensure_profile(&pool, "customer@cafe.local", "customer123", "customer").await?;
    seed_catalog(&pool).await?;
    seed_tables(&pool).await?;
    seed_coupons(&pool).await?;
    seed_settings(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_profile(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO profiles (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured profile {email} (role={role})");
    Ok(row.0)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = [("Coffee", 1), ("Tea", 2), ("Snacks", 3), ("Desserts", 4)];
    for (name, sort_order) in categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, sort_order)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET sort_order = EXCLUDED.sort_order
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(sort_order)
        .execute(pool)
        .await?;
    }

    let items: [(&str, &str, Decimal); 8] = [
        ("Coffee", "Espresso", Decimal::new(12000, 2)),
        ("Coffee", "Cappuccino", Decimal::new(16000, 2)),
        ("Coffee", "Cold Brew", Decimal::new(18000, 2)),
        ("Tea", "Masala Chai", Decimal::new(8000, 2)),
        ("Tea", "Green Tea", Decimal::new(9000, 2)),
        ("Snacks", "Veg Sandwich", Decimal::new(14000, 2)),
        ("Snacks", "Samosa", Decimal::new(4000, 2)),
        ("Desserts", "Chocolate Brownie", Decimal::new(15000, 2)),
    ];
    for (category, name, price) in items {
        sqlx::query(
            r#"
            INSERT INTO menu_items (id, category_id, name, price, available)
            SELECT $1, c.id, $2, $3, TRUE FROM categories c WHERE c.name = $4
            ON CONFLICT (name) DO UPDATE SET price = EXCLUDED.price
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(price)
        .bind(category)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}

async fn seed_tables(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for table_number in 1..=6 {
        let capacity = if table_number % 2 == 0 { 4 } else { 2 };
        sqlx::query(
            r#"
            INSERT INTO cafe_tables (id, table_number, capacity, is_available)
            VALUES ($1, $2, $3, TRUE)
            ON CONFLICT (table_number) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(table_number)
        .bind(capacity)
        .execute(pool)
        .await?;
    }

    println!("Seeded tables");
    Ok(())
}

async fn seed_coupons(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let coupons: [(&str, &str, Decimal, Decimal, i32); 2] = [
        ("FLAT50", "fixed", Decimal::new(5000, 2), Decimal::new(20000, 2), 100),
        ("SAVE20", "percent", Decimal::new(2000, 2), Decimal::new(10000, 2), 50),
    ];
    for (code, discount_type, discount_value, min_order, max_uses) in coupons {
        sqlx::query(
            r#"
            INSERT INTO coupons (id, code, discount_type, discount_value, min_order, max_uses, used_count, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, 0, TRUE)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(discount_type)
        .bind(discount_value)
        .bind(min_order)
        .bind(max_uses)
        .execute(pool)
        .await?;
    }

    println!("Seeded coupons");
    Ok(())
}

async fn seed_settings(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO cafe_settings (id, cafe_name, singleton)
        VALUES ($1, $2, TRUE)
        ON CONFLICT (singleton) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind("The Brew")
    .execute(pool)
    .await?;

    println!("Seeded settings");
    Ok(())
}
