//! Normalization: raw cell strings → typed `YieldQuote`s.
//!
//! This is the single validation boundary of the pipeline. Rows are
//! handled independently — one unparsable cell drops that row only,
//! never the whole snapshot. Losing every row is NO_DATA_FOUND.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::types::{FetchError, YieldCurveSnapshot};

/// Coerce extracted tenor/yield string pairs into a snapshot stamped
/// with `auction_date`.
///
/// Caller guarantees `tenors.len() == yields.len()` (the row extractor
/// already classified a mismatch as STRUCTURE_CHANGED).
pub fn normalize(
    tenors: &[String],
    yields: &[String],
    auction_date: NaiveDate,
) -> Result<YieldCurveSnapshot, FetchError> {
    debug_assert_eq!(tenors.len(), yields.len());

    let mut pairs: Vec<(u32, f64)> = Vec::with_capacity(tenors.len());
    for (tenor_raw, yield_raw) in tenors.iter().zip(yields) {
        let Some(tenor_days) = leading_digits(tenor_raw) else {
            debug!(cell = %tenor_raw, "Dropping row: tenor label has no digits");
            continue;
        };
        let Some(yield_percent) = parse_yield(yield_raw) else {
            debug!(tenor = tenor_days, cell = %yield_raw, "Dropping row: unparsable yield");
            continue;
        };
        pairs.push((tenor_days, yield_percent));
    }

    if pairs.is_empty() {
        return Err(FetchError::NoData(
            "no valid rows remained after normalization".to_string(),
        ));
    }

    swap_documented_anomaly(&mut pairs);

    Ok(YieldCurveSnapshot::from_pairs(auction_date, pairs))
}

/// The CBE page has a documented column-to-tenor mapping defect that
/// crosses the 182-day and 364-day yields. The correction is applied
/// unconditionally whenever both tenors are present — exact tenor match
/// only, never generalized to other pairs (the upstream root cause is
/// unknown and may change without notice).
fn swap_documented_anomaly(pairs: &mut [(u32, f64)]) {
    let pos_182 = pairs.iter().position(|(t, _)| *t == 182);
    let pos_364 = pairs.iter().position(|(t, _)| *t == 364);
    if let (Some(a), Some(b)) = (pos_182, pos_364) {
        warn!("Applying 182/364 yield swap correction");
        let tmp = pairs[a].1;
        pairs[a].1 = pairs[b].1;
        pairs[b].1 = tmp;
    }
}

/// Extract the leading run of digits from a tenor label, discarding
/// units and suffixes ("91 يوم" → 91). Zero is not a tenor.
fn leading_digits(s: &str) -> Option<u32> {
    let digits: String = s
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok().filter(|&t| t > 0)
}

/// Parse a yield cell as a positive decimal percentage. Tolerates a
/// trailing percent sign and surrounding whitespace.
fn parse_yield(s: &str) -> Option<f64> {
    s.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|y| y.is_finite() && *y > 0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
