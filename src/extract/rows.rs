//! Tenor / yield row extraction.
//!
//! Two table shapes have been observed on the CBE page:
//! (a) one wide results table, where the header row holds the tenor
//!     labels and the labelled row holds the yields;
//! (b) a separate header table above the results table, whose header
//!     supplies the tenor labels, paired positionally.
//! Both are handled here; everything stays as raw strings until the
//! normalizer.

use tracing::debug;

use super::{TableGrid, YIELD_ROW_LABEL, YIELD_ROW_LABEL_LOOSE};
use crate::types::FetchError;

/// Pull the tenor labels and the weighted-average accepted-yield cells
/// out of the located tables.
///
/// Classification contract:
/// - yield row absent after both the exact and the loose label match
///   ⇒ `NoData` (no new auction published; informational, not a fault);
/// - a row found but no tenor labels of matching count anywhere
///   ⇒ `StructureChanged` (alignment precondition violated).
pub fn extract_pairs(tables: &[TableGrid]) -> Result<(Vec<String>, Vec<String>), FetchError> {
    let (table_idx, row) = find_yield_row(tables, YIELD_ROW_LABEL)
        .or_else(|| {
            debug!("Exact yield label not found, trying loose match");
            find_yield_row(tables, YIELD_ROW_LABEL_LOOSE)
        })
        .ok_or_else(|| {
            FetchError::NoData("no new auction results are currently available".to_string())
        })?;

    let yields: Vec<String> = row[1..].to_vec();
    if yields.is_empty() {
        return Err(FetchError::StructureChanged(
            "yield row found but carries no value cells".to_string(),
        ));
    }

    // Shape (a): the same table's header supplies the tenors.
    let own_header = &tables[table_idx].header;
    if let Some(tenors) = tenor_labels(own_header, yields.len()) {
        return Ok((tenors, yields));
    }

    // Shape (b): walk back to the nearest preceding table whose header
    // width pairs with the yield count.
    for grid in tables[..table_idx].iter().rev() {
        if let Some(tenors) = tenor_labels(&grid.header, yields.len()) {
            debug!("Tenor labels taken from a preceding header table");
            return Ok((tenors, yields));
        }
    }

    Err(FetchError::StructureChanged(format!(
        "extracted {} yield cells but no table header supplies a matching tenor per cell",
        yields.len()
    )))
}

/// Find the last row whose first cell contains `label`, searching the
/// tables in document order and settling on the first table that has
/// any match. The page occasionally repeats the row (announced vs.
/// final figures); the last one is the final figure.
fn find_yield_row<'a>(
    tables: &'a [TableGrid],
    label: &str,
) -> Option<(usize, &'a Vec<String>)> {
    for (idx, grid) in tables.iter().enumerate() {
        let matched = grid
            .rows
            .iter()
            .filter(|row| row.first().is_some_and(|cell| cell.contains(label)))
            .next_back();
        if let Some(row) = matched {
            return Some((idx, row));
        }
    }
    None
}

/// Interpret a header row as tenor labels for `count` yield cells.
/// Accepts either an exact-width header (pure header table) or one with
/// a leading label column (wide results table).
fn tenor_labels(header: &[String], count: usize) -> Option<Vec<String>> {
    if header.len() == count + 1 {
        Some(header[1..].to_vec())
    } else if header.len() == count && count > 0 {
        Some(header.to_vec())
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
