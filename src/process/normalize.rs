use std::collections::HashSet;
use tracing::debug;

use crate::sheet::RawGrid;
use crate::table::SheetTable;

/// Turn a raw grid into a labelled table.
///
/// - labels come from row `header_row`; columns with a blank label are dropped
/// - labels are forced to (trimmed) text
/// - a repeated label keeps only its first column
/// - data starts at row `start_row`, independently of `header_row`
pub fn normalize(grid: &RawGrid, header_row: usize, start_row: usize) -> SheetTable {
    let mut keep: Vec<usize> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut dropped_blank = 0usize;
    let mut dropped_dup = 0usize;

    for col in 0..grid.width() {
        let cell = grid.get(header_row, col);
        let label = match cell.to_text() {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => {
                dropped_blank += 1;
                continue;
            }
        };
        if !seen.insert(label.clone()) {
            dropped_dup += 1;
            continue;
        }
        keep.push(col);
        labels.push(label);
    }

    let rows = (start_row..grid.height())
        .map(|r| keep.iter().map(|&c| grid.get(r, c).clone()).collect())
        .collect();

    debug!(
        header_row,
        start_row,
        columns = labels.len(),
        dropped_blank,
        dropped_dup,
        "normalized header"
    );
    SheetTable::new(labels, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cell;

    fn grid() -> RawGrid {
        RawGrid::new(vec![
            vec!["Title".into()],
            vec![],
            vec![
                " Admin 1 ".into(),
                Cell::Empty,
                "Final PiN".into(),
                2025.0.into(),
                "Final PiN".into(),
            ],
            vec!["sub-header".into()],
            vec!["Niassa".into(), "x".into(), 10.0.into(), 1.0.into(), 99.0.into()],
            vec!["Tete".into(), "y".into(), "-".into(), 2.0.into(), 98.0.into()],
        ])
    }

    #[test]
    fn drops_blank_and_duplicate_labels() {
        let t = normalize(&grid(), 2, 4);
        assert_eq!(t.labels(), &["Admin 1", "Final PiN", "2025"]);
        assert_eq!(t.height(), 2);
        assert_eq!(t.rows()[0], vec![Cell::from("Niassa"), Cell::Number(10.0), Cell::Number(1.0)]);
        assert_eq!(t.rows()[1][1], Cell::from("-"));
    }

    #[test]
    fn start_row_is_independent_of_header_row() {
        let t = normalize(&grid(), 2, 3);
        assert_eq!(t.height(), 3);
        assert_eq!(t.rows()[0][0], Cell::from("sub-header"));
    }

    #[test]
    fn header_past_end_yields_no_columns() {
        let t = normalize(&grid(), 40, 50);
        assert!(t.labels().is_empty());
        assert_eq!(t.height(), 0);
    }
}
