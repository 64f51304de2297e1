pub mod admin_service;
pub mod auth_service;
pub mod coupon_service;
pub mod menu_service;
pub mod order_service;
pub mod payment_service;
pub mod settings_service;
pub mod table_service;
