use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use thiserror::Error;

/// Typed values of one canonical column. `None` is the explicit
/// "missing" marker; a numeric cell is never textual.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Number(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Number(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Number(v) => ColumnData::Number(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Text(v) => ColumnData::Text(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn number(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Number(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Number(_))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TableShapeError {
    #[error("column `{name}` has {got} rows, expected {expected}")]
    RaggedColumn {
        name: String,
        got: usize,
        expected: usize,
    },
    #[error("column `{0}` appears more than once")]
    DuplicateColumn(String),
}

/// The schema-normalised, area-grain output of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalTable {
    columns: Vec<Column>,
    len: usize,
}

impl CanonicalTable {
    pub fn new(columns: Vec<Column>) -> Result<Self, TableShapeError> {
        let len = columns.first().map_or(0, |c| c.data.len());
        let mut seen = HashSet::new();
        for c in &columns {
            if c.data.len() != len {
                return Err(TableShapeError::RaggedColumn {
                    name: c.name.clone(),
                    got: c.data.len(),
                    expected: len,
                });
            }
            if !seen.insert(c.name.as_str()) {
                return Err(TableShapeError::DuplicateColumn(c.name.clone()));
            }
        }
        Ok(Self { columns, len })
    }

    /// Table with `len` rows and no columns yet.
    pub fn with_len(len: usize) -> Self {
        Self {
            columns: Vec::new(),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Values of a numeric column; `None` when absent or textual.
    pub fn numbers(&self, name: &str) -> Option<&[Option<f64>]> {
        match &self.column(name)?.data {
            ColumnData::Number(v) => Some(v.as_slice()),
            ColumnData::Text(_) => None,
        }
    }

    /// Values of a text column; `None` when absent or numeric.
    pub fn texts(&self, name: &str) -> Option<&[Option<String>]> {
        match &self.column(name)?.data {
            ColumnData::Text(v) => Some(v.as_slice()),
            ColumnData::Number(_) => None,
        }
    }

    /// Row keys of `name` as text, whichever type the column has.
    pub fn keys(&self, name: &str) -> Option<Vec<Option<String>>> {
        Some(match &self.column(name)?.data {
            ColumnData::Text(v) => v
                .iter()
                .map(|s| s.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
                .collect(),
            ColumnData::Number(v) => v.iter().map(|n| n.map(crate::sheet::format_number)).collect(),
        })
    }

    /// Replace (in place) or append a column.
    pub fn put(&mut self, column: Column) {
        debug_assert_eq!(column.data.len(), self.len, "column `{}`", column.name);
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(slot) => *slot = column,
            None => self.columns.push(column),
        }
    }

    pub fn put_numbers(&mut self, name: &str, values: Vec<Option<f64>>) {
        self.put(Column::number(name, values));
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// New table holding `rows` (by index, in the given order).
    pub fn select_rows(&self, rows: &[usize]) -> CanonicalTable {
        CanonicalTable {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.select(rows),
                })
                .collect(),
            len: rows.len(),
        }
    }

    pub fn row(&self, index: usize) -> CanonicalRow<'_> {
        CanonicalRow { table: self, index }
    }

    pub fn rows(&self) -> impl Iterator<Item = CanonicalRow<'_>> {
        (0..self.len).map(move |i| self.row(i))
    }

    /// Rows as JSON objects; missing values become `null`.
    pub fn to_json_rows(&self) -> Vec<Value> {
        self.rows().map(|r| Value::Object(r.to_json())).collect()
    }
}

/// Borrowed view of one area's record.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalRow<'a> {
    table: &'a CanonicalTable,
    index: usize,
}

impl<'a> CanonicalRow<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.table.numbers(column)?[self.index]
    }

    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.table.texts(column)?[self.index].as_deref()
    }

    pub fn to_json(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for c in self.table.columns() {
            let v = match &c.data {
                ColumnData::Number(v) => v[self.index]
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number),
                ColumnData::Text(v) => v[self.index]
                    .as_ref()
                    .map_or(Value::Null, |s| Value::String(s.clone())),
            };
            out.insert(c.name.clone(), v);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CanonicalTable {
        CanonicalTable::new(vec![
            Column::text("Admin 2 P-Code", vec![Some("MZ01".into()), Some("MZ02".into())]),
            Column::number("Final PiN", vec![Some(10.0), None]),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_ragged_and_duplicate_columns() {
        let ragged = CanonicalTable::new(vec![
            Column::number("a", vec![Some(1.0)]),
            Column::number("b", vec![]),
        ]);
        assert!(matches!(ragged, Err(TableShapeError::RaggedColumn { .. })));

        let dup = CanonicalTable::new(vec![
            Column::number("a", vec![Some(1.0)]),
            Column::text("a", vec![None]),
        ]);
        assert_eq!(dup, Err(TableShapeError::DuplicateColumn("a".into())));
    }

    #[test]
    fn row_view_reads_typed_values() {
        let t = sample();
        let r = t.row(1);
        assert_eq!(r.text("Admin 2 P-Code"), Some("MZ02"));
        assert_eq!(r.number("Final PiN"), None);
        assert_eq!(t.row(0).number("Final PiN"), Some(10.0));
        // wrong type and absent columns are both "not there"
        assert_eq!(r.number("Admin 2 P-Code"), None);
        assert_eq!(r.text("Nope"), None);
    }

    #[test]
    fn select_rows_reorders() {
        let t = sample().select_rows(&[1, 0]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.numbers("Final PiN"), Some(&[None, Some(10.0)][..]));
    }

    #[test]
    fn json_rows_use_null_for_missing() {
        let rows = sample().to_json_rows();
        assert_eq!(rows[1]["Final PiN"], Value::Null);
        assert_eq!(rows[0]["Final PiN"], serde_json::json!(10.0));
    }
}
