//! Extraction pipeline: raw HTML → validated yield-curve snapshot.
//!
//! Three stages, each with its own failure classification:
//! - `locate`: find the result tables after the anchor heading
//!   (anchor missing ⇒ STRUCTURE_CHANGED).
//! - `rows`: pull tenor labels and yield cells out of the tables
//!   (row absent ⇒ NO_DATA_FOUND, misaligned counts ⇒ STRUCTURE_CHANGED).
//! - `normalize`: the typed boundary, raw strings in,
//!   `YieldQuote`s out. Loosely-typed cell text never crosses it.

pub mod locate;
pub mod normalize;
pub mod rows;

use chrono::NaiveDate;

use crate::types::{FetchError, YieldCurveSnapshot};

/// The heading the CBE puts above the auction result tables
/// ("النتائج" = "Results"). If this disappears, the page layout has
/// drifted and the extraction logic needs maintenance.
pub const ANCHOR_HEADING: &str = "النتائج";

/// Exact row label for the weighted-average accepted yield
/// ("متوسط العائد المرجح المقبول").
pub const YIELD_ROW_LABEL: &str = "متوسط العائد المرجح المقبول";

/// Loose fallback: the label without the "accepted" qualifier, seen on
/// older renderings of the page ("متوسط العائد المرجح").
pub const YIELD_ROW_LABEL_LOOSE: &str = "متوسط العائد المرجح";

/// Loosely-typed intermediate shape of one located table. Cell text is
/// whitespace-normalized but otherwise untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableGrid {
    /// First row of the table (the thead row, or just the first `<tr>`).
    pub header: Vec<String>,
    /// Remaining rows.
    pub rows: Vec<Vec<String>>,
}

/// Run the full extraction pipeline over one page of markup.
///
/// The resulting snapshot is stamped with `auction_date` and sorted
/// ascending by tenor.
pub fn extract_snapshot(
    html: &str,
    auction_date: NaiveDate,
) -> Result<YieldCurveSnapshot, FetchError> {
    let tables = locate::tables_after_anchor(html)?;
    let (tenors, yields) = rows::extract_pairs(&tables)?;
    normalize::normalize(&tenors, &yields, auction_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // End-to-end over a realistic single-wide-table page. Stage-level
    // edge cases live in the submodule tests.
    #[test]
    fn test_extract_snapshot_end_to_end() {
        let html = r#"
            <html><body>
            <h2>عطاءات أذون الخزانة</h2>
            <h2>النتائج</h2>
            <table>
              <tr><th>البيان</th><th>91 يوم</th><th>182 يوم</th><th>273 يوم</th><th>364 يوم</th></tr>
              <tr><td>إجمالي العطاءات</td><td>500</td><td>400</td><td>300</td><td>200</td></tr>
              <tr><td>متوسط العائد المرجح المقبول (%)</td><td>26.9</td><td>27.1</td><td>26.5</td><td>25.0</td></tr>
            </table>
            </body></html>
        "#;
        let d = NaiveDate::from_ymd_opt(2026, 2, 12).unwrap();
        let snap = extract_snapshot(html, d).unwrap();

        assert_eq!(snap.auction_date, d);
        assert_eq!(snap.tenors(), vec![91, 182, 273, 364]);
        // 182/364 anomaly correction applied: those two swapped.
        assert_eq!(snap.yield_for(91), Some(26.9));
        assert_eq!(snap.yield_for(182), Some(25.0));
        assert_eq!(snap.yield_for(273), Some(26.5));
        assert_eq!(snap.yield_for(364), Some(27.1));
    }
}
