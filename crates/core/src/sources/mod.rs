//! Source fetcher implementations.

pub mod csv;

pub use csv::CsvPriceFetcher;
