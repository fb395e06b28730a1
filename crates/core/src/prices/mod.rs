//! Price record domain: model, strong types, and storage/source traits.

pub mod model;
pub mod store;
pub mod types;

pub use model::{compute_derived, PriceRecord};
pub use store::{ChunkOutcome, PriceFetcher, PriceStore, RowFailure, WarehouseStats};
pub use types::{RecordKey, Ticker};
