//! Domain models for the SARA inventory platform

mod activity;
mod group;
mod invoice;
mod item;
mod report;
mod shop;
mod user;

pub use activity::*;
pub use group::*;
pub use invoice::*;
pub use item::*;
pub use report::*;
pub use shop::*;
pub use user::*;
