//! Page handlers, one per request label.

pub mod product;
pub mod start;

pub use product::{handle_product, PageOffers, PageStage};
pub use start::handle_start;
