use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod coupons;
pub mod doc;
pub mod events;
pub mod health;
pub mod menu;
pub mod orders;
pub mod params;
pub mod payments;
pub mod settings;
pub mod tables;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/menu", menu::router())
        .nest("/tables", tables::router())
        .nest("/coupons", coupons::router())
        .nest("/settings", settings::router())
        .nest("/orders", orders::route())
        .nest("/payments", payments::router())
        .nest("/events", events::router())
        .nest("/admin", admin::router())
}
