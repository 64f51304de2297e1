pub mod auth;
pub mod coupons;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod settings;
pub mod tables;
