pub mod model;
pub mod repository;

pub use model::{NewPriceRow, PriceRowDb};
pub use repository::SqlitePriceStore;
