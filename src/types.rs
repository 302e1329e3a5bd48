//! Shared types for KHAZNA.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that fetch, extract, store,
//! and calc modules can depend on them without circular references.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Yield quotes & snapshots
// ---------------------------------------------------------------------------

/// One published observation: the weighted-average accepted yield for a
/// single tenor at a single auction date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldQuote {
    /// Days until maturity (91, 182, 273, 364 are the usual CBE tenors,
    /// but the set is open — whatever the auction publishes).
    pub tenor_days: u32,
    /// Annualized yield in percent (typically 1–100).
    pub yield_percent: f64,
    /// The auction date this quote belongs to.
    pub auction_date: NaiveDate,
}

impl fmt::Display for YieldQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d @ {:.3}% ({})",
            self.tenor_days, self.yield_percent, self.auction_date,
        )
    }
}

/// The complete set of tenor→yield pairs published for one auction date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldCurveSnapshot {
    pub auction_date: NaiveDate,
    /// Quotes sharing `auction_date`, ascending by tenor for display.
    pub quotes: Vec<YieldQuote>,
}

impl fmt::Display for YieldCurveSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .quotes
            .iter()
            .map(|q| format!("{}d={:.3}%", q.tenor_days, q.yield_percent))
            .collect();
        write!(f, "[{}] {}", self.auction_date, pairs.join(" | "))
    }
}

impl YieldCurveSnapshot {
    /// Build a snapshot from (tenor, yield) pairs, stamping every quote
    /// with the given auction date and sorting ascending by tenor.
    pub fn from_pairs(auction_date: NaiveDate, pairs: Vec<(u32, f64)>) -> Self {
        let mut quotes: Vec<YieldQuote> = pairs
            .into_iter()
            .map(|(tenor_days, yield_percent)| YieldQuote {
                tenor_days,
                yield_percent,
                auction_date,
            })
            .collect();
        quotes.sort_by_key(|q| q.tenor_days);
        Self {
            auction_date,
            quotes,
        }
    }

    /// The built-in bootstrap snapshot, used when the store has never
    /// been written. Reference values from a published CBE auction.
    pub fn fallback() -> Self {
        Self::from_pairs(
            Utc::now().date_naive(),
            vec![(91, 29.108), (182, 28.274), (273, 27.184), (364, 25.230)],
        )
    }

    /// Look up the yield for a specific tenor.
    pub fn yield_for(&self, tenor_days: u32) -> Option<f64> {
        self.quotes
            .iter()
            .find(|q| q.tenor_days == tenor_days)
            .map(|q| q.yield_percent)
    }

    /// All tenors in this snapshot, ascending.
    pub fn tenors(&self) -> Vec<u32> {
        let mut t: Vec<u32> = self.quotes.iter().map(|q| q.tenor_days).collect();
        t.sort_unstable();
        t
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Fetch outcome taxonomy
// ---------------------------------------------------------------------------

/// Classification of one acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchStatus {
    /// A fresh snapshot was extracted and persisted.
    Success,
    /// Page reachable, but no new auction results published. Informational.
    NoDataFound,
    /// The anchor-based extraction assumptions no longer hold — the
    /// upstream layout drifted and the extraction logic needs maintenance.
    StructureChanged,
    /// Network / timeout / automation-session failure. Retry later.
    TransportError,
    /// Catch-all for parsing or runtime faults.
    UnexpectedError,
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStatus::Success => write!(f, "SUCCESS"),
            FetchStatus::NoDataFound => write!(f, "NO_DATA_FOUND"),
            FetchStatus::StructureChanged => write!(f, "STRUCTURE_CHANGED"),
            FetchStatus::TransportError => write!(f, "TRANSPORT_ERROR"),
            FetchStatus::UnexpectedError => write!(f, "UNEXPECTED_ERROR"),
        }
    }
}

/// The tagged result of one acquisition attempt. Exactly one of
/// `snapshot` (on Success) or the explanatory `message` is meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub status: FetchStatus,
    pub snapshot: Option<YieldCurveSnapshot>,
    pub message: String,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.snapshot {
            Some(s) => write!(f, "{}: {}", self.status, s),
            None => write!(f, "{}: {}", self.status, self.message),
        }
    }
}

impl FetchOutcome {
    /// A successful outcome carrying the freshly extracted snapshot.
    pub fn success(snapshot: YieldCurveSnapshot) -> Self {
        Self {
            status: FetchStatus::Success,
            snapshot: Some(snapshot),
            message: "Data updated successfully".to_string(),
            fetched_at: Some(Utc::now()),
        }
    }

    /// A failure outcome of the given kind. Never carries a snapshot.
    pub fn failure(status: FetchStatus, message: impl Into<String>) -> Self {
        debug_assert!(status != FetchStatus::Success);
        Self {
            status,
            snapshot: None,
            message: message.into(),
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }
}

impl From<FetchError> for FetchOutcome {
    fn from(err: FetchError) -> Self {
        FetchOutcome::failure(err.status(), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific errors for the fetch pipeline.
///
/// Every pipeline stage returns these; the orchestrator converts them
/// into a `FetchOutcome` at its boundary so nothing propagates to the
/// interactive surface as an uncaught fault.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Page structure changed: {0}")]
    StructureChanged(String),

    #[error("No auction data found: {0}")]
    NoData(String),

    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl FetchError {
    /// The outcome status this error maps to.
    pub fn status(&self) -> FetchStatus {
        match self {
            FetchError::Transport(_) => FetchStatus::TransportError,
            FetchError::StructureChanged(_) => FetchStatus::StructureChanged,
            FetchError::NoData(_) => FetchStatus::NoDataFound,
            FetchError::Unexpected(_) => FetchStatus::UnexpectedError,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
