/// One untyped workbook cell. Numbers stay numbers; everything the
/// workbook does not encode as a number is text or empty.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Empty, or text that is only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Number(_) => false,
            Cell::Text(s) => s.trim().is_empty(),
        }
    }

    /// Stringified value; `None` for an empty cell.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<Option<f64>> for Cell {
    fn from(n: Option<f64>) -> Self {
        n.map_or(Cell::Empty, Cell::Number)
    }
}

/// Render integral floats without a trailing `.0` so numeric codes and
/// year headers read the way they were typed.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A header-less sheet addressed purely by position. Rows may be ragged;
/// reads past the end of a row yield `Cell::Empty`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<Cell>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn get(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_past_ragged_rows_are_empty() {
        let grid = RawGrid::new(vec![vec!["a".into(), 1.0.into()], vec!["b".into()]]);
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.get(1, 1), &Cell::Empty);
        assert_eq!(grid.get(9, 0), &Cell::Empty);
        assert_eq!(grid.get(0, 1), &Cell::Number(1.0));
    }

    #[test]
    fn numbers_stringify_without_trailing_zero() {
        assert_eq!(Cell::Number(2025.0).to_text().as_deref(), Some("2025"));
        assert_eq!(Cell::Number(0.25).to_text().as_deref(), Some("0.25"));
        assert_eq!(Cell::Empty.to_text(), None);
        assert!(Cell::Text("  ".into()).is_blank());
    }
}
