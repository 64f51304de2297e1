pub mod audit_logs;
pub mod cafe_settings;
pub mod cafe_tables;
pub mod categories;
pub mod coupons;
pub mod menu_items;
pub mod order_items;
pub mod orders;
pub mod profiles;

pub use audit_logs::Entity as AuditLogs;
pub use cafe_settings::Entity as CafeSettings;
pub use cafe_tables::Entity as CafeTables;
pub use categories::Entity as Categories;
pub use coupons::Entity as Coupons;
pub use menu_items::Entity as MenuItems;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use profiles::Entity as Profiles;
