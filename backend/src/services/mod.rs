//! Business logic services for the SARA inventory backend

pub mod audit;
pub mod auth;
pub mod csv_import;
pub mod group;
pub mod invoice;
pub mod item;
pub mod listing;
pub mod reporting;
pub mod shop;
pub mod user;

pub use audit::AuditLog;
pub use auth::AuthService;
pub use csv_import::CsvImportService;
pub use group::GroupService;
pub use invoice::InvoiceService;
pub use item::ItemService;
pub use reporting::ReportingService;
pub use shop::ShopService;
pub use user::UserService;
