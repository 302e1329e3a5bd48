//! Table location by anchor phrase.
//!
//! The CBE page carries several unrelated tables (announcements,
//! settlement calendars). The only structural assumption we allow
//! ourselves is the anchor convention: the result tables come after a
//! heading containing [`ANCHOR_HEADING`]. Positional assumptions beyond
//! that have broken before.

use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use super::{TableGrid, ANCHOR_HEADING};
use crate::types::FetchError;

/// Find every table that follows the last occurrence of the anchor
/// phrase, in document order.
///
/// Anchor absent anywhere ⇒ `StructureChanged`. Anchor present but no
/// table after it ⇒ also `StructureChanged`: both mean the layout
/// drifted, not that the auction has no data.
pub fn tables_after_anchor(html: &str) -> Result<Vec<TableGrid>, FetchError> {
    let doc = Html::parse_document(html);

    // One pass in document order: remember where the anchor text last
    // appears and where every table sits relative to it. The page
    // repeats the phrase in navigation crumbs, so the last occurrence
    // (the section heading proper) is the one that matters.
    let mut last_anchor: Option<usize> = None;
    let mut tables: Vec<(usize, ElementRef<'_>)> = Vec::new();

    for (pos, node) in doc.tree.root().descendants().enumerate() {
        match node.value() {
            Node::Text(t) if t.text.contains(ANCHOR_HEADING) => {
                last_anchor = Some(pos);
            }
            Node::Element(el) if el.name() == "table" => {
                if let Some(table) = ElementRef::wrap(node) {
                    tables.push((pos, table));
                }
            }
            _ => {}
        }
    }

    let anchor_pos = last_anchor.ok_or_else(|| {
        FetchError::StructureChanged(format!(
            "results heading '{ANCHOR_HEADING}' not found anywhere in the document"
        ))
    })?;

    let grids: Vec<TableGrid> = tables
        .into_iter()
        .filter(|(pos, _)| *pos > anchor_pos)
        .map(|(_, table)| grid_from_table(table))
        .collect();

    if grids.is_empty() {
        return Err(FetchError::StructureChanged(
            "results heading found but no table follows it".to_string(),
        ));
    }

    debug!(tables = grids.len(), "Located result tables after anchor");
    Ok(grids)
}

/// Flatten a `<table>` element into rows of whitespace-normalized cell
/// text. The first row becomes the header.
fn grid_from_table(table: ElementRef<'_>) -> TableGrid {
    let tr = Selector::parse("tr").expect("static selector");
    let cell = Selector::parse("th, td").expect("static selector");

    let mut rows: Vec<Vec<String>> = table
        .select(&tr)
        .map(|row| row.select(&cell).map(|c| cell_text(c)).collect())
        .filter(|cells: &Vec<String>| !cells.is_empty())
        .collect();

    if rows.is_empty() {
        return TableGrid::default();
    }
    let header = rows.remove(0);
    TableGrid { header, rows }
}

/// Concatenate an element's text nodes and collapse runs of whitespace.
fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_missing_is_structure_changed() {
        let html = "<html><body><h2>عطاءات</h2><table><tr><td>x</td></tr></table></body></html>";
        let err = tables_after_anchor(html).unwrap_err();
        assert!(matches!(err, FetchError::StructureChanged(_)));
    }

    #[test]
    fn test_anchor_without_following_table_is_structure_changed() {
        let html = "<html><body><table><tr><td>before</td></tr></table><h2>النتائج</h2><p>nothing here</p></body></html>";
        let err = tables_after_anchor(html).unwrap_err();
        assert!(matches!(err, FetchError::StructureChanged(_)));
    }

    #[test]
    fn test_tables_before_anchor_are_ignored() {
        let html = r#"
            <body>
            <table><tr><th>irrelevant</th></tr><tr><td>calendar</td></tr></table>
            <h2>النتائج</h2>
            <table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></table>
            </body>
        "#;
        let grids = tables_after_anchor(html).unwrap();
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].header, vec!["A", "B"]);
        assert_eq!(grids[0].rows, vec![vec!["1", "2"]]);
    }

    #[test]
    fn test_last_anchor_occurrence_wins() {
        // The phrase also appears in a breadcrumb before an unrelated
        // table; only tables after the real section heading count.
        let html = r#"
            <body>
            <nav>النتائج</nav>
            <table><tr><td>unrelated</td></tr></table>
            <h2>النتائج</h2>
            <table><tr><th>H</th></tr><tr><td>v</td></tr></table>
            </body>
        "#;
        let grids = tables_after_anchor(html).unwrap();
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].header, vec!["H"]);
    }

    #[test]
    fn test_multiple_tables_collected_in_document_order() {
        let html = r#"
            <body><h2>النتائج</h2>
            <table><tr><th>first</th></tr></table>
            <table><tr><th>second</th></tr></table>
            </body>
        "#;
        let grids = tables_after_anchor(html).unwrap();
        assert_eq!(grids.len(), 2);
        assert_eq!(grids[0].header, vec!["first"]);
        assert_eq!(grids[1].header, vec!["second"]);
    }

    #[test]
    fn test_cell_text_whitespace_collapsed() {
        let html = "<body><h2>النتائج</h2><table><tr><th>  متوسط \n العائد </th></tr><tr><td> 26.9 </td></tr></table></body>";
        let grids = tables_after_anchor(html).unwrap();
        assert_eq!(grids[0].header, vec!["متوسط العائد"]);
        assert_eq!(grids[0].rows[0], vec!["26.9"]);
    }
}
