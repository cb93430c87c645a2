//! Item valuation: price parsing, reference data, item records and ranking

pub mod catalog;
pub mod config;
pub mod error;
pub mod item;
pub mod log;
pub mod price;
pub mod ranking;

// Re-export main types for cleaner imports
pub use catalog::{ReferenceCatalog, ReferenceEntry};
pub use error::{FetchError, FormatError, ItemError};
pub use item::{ItemFetcher, ItemOutcome, ItemQuery, ItemRecord, ItemResolver};
pub use price::{MAX_PRICE, parse_price};
pub use ranking::{
    AlchMode, CATALYST_ID, CatalystOracle, FixedCatalyst, LiveCatalyst, ProfitabilityRanker,
    Ranking,
};
