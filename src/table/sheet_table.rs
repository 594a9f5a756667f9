use crate::sheet::Cell;

/// A labelled but still untyped table: the state of a sheet between
/// header normalisation and numeric coercion. Columns are addressed by
/// runtime label; every row has exactly one cell per label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    labels: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl SheetTable {
    /// Rows are padded or truncated to the number of labels.
    pub fn new(labels: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = labels.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, Cell::Empty);
                r
            })
            .collect();
        Self { labels, rows }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn has(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    /// Cells of `label`, top to bottom.
    pub fn column(&self, label: &str) -> Option<Vec<&Cell>> {
        let idx = self.position(label)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    pub(crate) fn set_label(&mut self, idx: usize, label: String) {
        self.labels[idx] = label;
    }

    /// Replace the column called `label`, or append it.
    pub fn put_column(&mut self, label: &str, cells: Vec<Cell>) {
        debug_assert_eq!(cells.len(), self.rows.len());
        match self.position(label) {
            Some(idx) => {
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row[idx] = cell;
                }
            }
            None => {
                self.labels.push(label.to_string());
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row.push(cell);
                }
            }
        }
    }

    /// Drop the column called `label`. Returns whether it existed.
    pub fn remove_column(&mut self, label: &str) -> bool {
        let Some(idx) = self.position(label) else {
            return false;
        };
        self.labels.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// Merge every later column sharing a label into the first one: blank
    /// cells of the first are filled from the later column, which is then
    /// removed. Returns the labels that were merged.
    pub fn coalesce_duplicate_labels(&mut self) -> Vec<String> {
        let mut merged = Vec::new();
        let mut idx = 0;
        while idx < self.labels.len() {
            let first = self
                .position(&self.labels[idx])
                .unwrap_or(idx);
            if first == idx {
                idx += 1;
                continue;
            }
            for row in &mut self.rows {
                let later = row.remove(idx);
                if row[first].is_blank() && !later.is_blank() {
                    row[first] = later;
                }
            }
            merged.push(self.labels.remove(idx));
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(ls: &[&str]) -> Vec<String> {
        ls.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rows_are_squared_to_labels() {
        let t = SheetTable::new(labels(&["a", "b"]), vec![vec!["x".into()], vec![1.0.into(), 2.0.into(), 3.0.into()]]);
        assert_eq!(t.rows()[0], vec![Cell::Text("x".into()), Cell::Empty]);
        assert_eq!(t.rows()[1].len(), 2);
    }

    #[test]
    fn duplicate_labels_coalesce_into_first() {
        let mut t = SheetTable::new(
            labels(&["Final PiN", "Admin 1", "Final PiN"]),
            vec![
                vec![Cell::Empty, "A".into(), 10.0.into()],
                vec![5.0.into(), "B".into(), 7.0.into()],
            ],
        );
        let merged = t.coalesce_duplicate_labels();
        assert_eq!(merged, vec!["Final PiN".to_string()]);
        assert_eq!(t.labels(), &labels(&["Final PiN", "Admin 1"])[..]);
        assert_eq!(t.rows()[0][0], Cell::Number(10.0));
        assert_eq!(t.rows()[1][0], Cell::Number(5.0));
    }

    #[test]
    fn remove_column_drops_label_and_cells() {
        let mut t = SheetTable::new(labels(&["a", "b", "c"]), vec![vec![1.0.into(), 2.0.into(), 3.0.into()]]);
        assert!(t.remove_column("b"));
        assert!(!t.remove_column("b"));
        assert_eq!(t.labels(), &labels(&["a", "c"])[..]);
        assert_eq!(t.rows()[0], vec![Cell::Number(1.0), Cell::Number(3.0)]);
    }

    #[test]
    fn put_column_replaces_or_appends() {
        let mut t = SheetTable::new(labels(&["a"]), vec![vec![1.0.into()]]);
        t.put_column("a", vec![2.0.into()]);
        t.put_column("b", vec!["z".into()]);
        assert_eq!(t.labels(), &labels(&["a", "b"])[..]);
        assert_eq!(t.rows()[0], vec![Cell::Number(2.0), Cell::Text("z".into())]);
    }
}
