//! HTTP request handlers

pub mod auth;
pub mod groups;
pub mod health;
pub mod invoices;
pub mod items;
pub mod reporting;
pub mod shops;
pub mod users;

pub use auth::{login, update_password};
pub use groups::{create_group, list_groups};
pub use health::health_check;
pub use invoices::{create_invoice, list_invoices};
pub use items::{create_item, list_items, upload_items_csv};
pub use reporting::{get_purchase_summary, get_sales_by_shop, get_summary, get_top_selling};
pub use shops::{create_shop, list_shops};
pub use users::{create_user, list_activity_log, list_users, me};
