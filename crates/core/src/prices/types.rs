//! Strong types for the price warehouse.
//!
//! - `Ticker` - The equity identifier half of the natural key
//! - `RecordKey` - The `(ticker, date)` natural key of a price record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Ticker
// =============================================================================

/// Equity ticker symbol.
///
/// Examples: "AAPL", "MSFT", "BRK.B"
///
/// Together with a calendar date this forms the natural key of a price
/// record, both within a batch and within the warehouse table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Ticker(pub String);

impl Ticker {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the symbol is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// RecordKey
// =============================================================================

/// Natural key of a price record: `(ticker, date)`.
///
/// The date half is optional because source records can arrive with an
/// unparseable date; such records never survive validation, but they must
/// be representable so the validator can report and excise them.
pub type RecordKey = (Ticker, Option<NaiveDate>);
