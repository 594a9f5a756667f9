use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::sheet::Cell;
use crate::table::{CanonicalTable, Column, SheetTable};

/// `1,000` / `-12,345.5`: comma thousands separators only in grouped position.
static THOUSANDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("static regex"));

/// Repairs the textual artifacts country exports leave in numeric cells.
///
/// A lone hyphen is an explicit zero; blanks and anything still unparseable
/// are missing. Zero and missing are never conflated.
#[derive(Debug, Clone)]
pub struct NumericCoercer {
    no_data: Option<Regex>,
}

impl NumericCoercer {
    /// `tags` are the no-data markers to strip (with any trailing
    /// whitespace) wherever they appear inside a cell.
    pub fn new(tags: &[String]) -> Self {
        let tags: Vec<String> = tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect();
        if tags.is_empty() {
            return Self { no_data: None };
        }
        let pattern = format!(r"(?:{})\s*", tags.join("|"));
        match Regex::new(&pattern) {
            Ok(re) => Self { no_data: Some(re) },
            Err(e) => {
                warn!("ignoring no-data tags, bad pattern {}: {}", pattern, e);
                Self { no_data: None }
            }
        }
    }

    /// Parse one cell; `None` is "missing".
    pub fn parse(&self, cell: &Cell) -> Option<f64> {
        match cell {
            Cell::Empty => None,
            Cell::Number(n) => Some(*n).filter(|n| n.is_finite()),
            Cell::Text(s) => self.parse_str(s),
        }
    }

    /// Parse for summation inside an aggregation group, where an
    /// unparseable member contributes nothing.
    pub fn parse_or_zero(&self, cell: &Cell) -> f64 {
        self.parse(cell).unwrap_or(0.0)
    }

    pub fn parse_str(&self, raw: &str) -> Option<f64> {
        let trimmed = raw.trim();
        let text = if trimmed == "-" { "0" } else { trimmed };
        let stripped = match &self.no_data {
            Some(re) => re.replace_all(text, ""),
            None => text.into(),
        };
        let s = stripped.trim();
        if s.is_empty() {
            return None;
        }
        let parsed = if THOUSANDS.is_match(s) {
            s.replace(',', "").parse::<f64>().ok()
        } else {
            s.parse::<f64>().ok()
        };
        parsed.filter(|n| n.is_finite())
    }

    /// Type every column: labels in `numeric` become numeric columns, the
    /// rest are carried as text. Numeric labels that are absent are skipped.
    pub fn coerce(&self, table: &SheetTable, numeric: &[String]) -> CanonicalTable {
        let numeric: HashSet<&str> = numeric.iter().map(String::as_str).collect();
        let mut out = CanonicalTable::with_len(table.height());

        for (idx, label) in table.labels().iter().enumerate() {
            let cells = table.rows().iter().map(|r| &r[idx]);
            if numeric.contains(label.as_str()) {
                let mut unparsed = 0usize;
                let values: Vec<Option<f64>> = cells
                    .map(|c| {
                        let v = self.parse(c);
                        if v.is_none() && !c.is_blank() {
                            unparsed += 1;
                        }
                        v
                    })
                    .collect();
                if unparsed > 0 {
                    debug!(column = %label, unparsed, "unparseable cells set to missing");
                }
                out.put(Column::number(label.as_str(), values));
            } else {
                let values = cells.map(Cell::to_text).collect();
                out.put(Column::text(label.as_str(), values));
            }
        }
        out
    }
}

impl Default for NumericCoercer {
    fn default() -> Self {
        Self::new(&["NoPIN26".to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphen_is_zero_blank_is_missing() {
        let c = NumericCoercer::default();
        assert_eq!(c.parse(&Cell::from("-")), Some(0.0));
        assert_eq!(c.parse(&Cell::from(" - ")), Some(0.0));
        assert_eq!(c.parse(&Cell::Empty), None);
        assert_eq!(c.parse(&Cell::from("   ")), None);
    }

    #[test]
    fn strips_no_data_tag() {
        let c = NumericCoercer::default();
        assert_eq!(c.parse(&Cell::from("NoPIN26 1200")), Some(1200.0));
        assert_eq!(c.parse(&Cell::from("NoPIN261200")), Some(1200.0));
        // the tag alone leaves nothing to parse
        assert_eq!(c.parse(&Cell::from("NoPIN26 ")), None);
    }

    #[test]
    fn garbage_is_missing_not_zero() {
        let c = NumericCoercer::default();
        assert_eq!(c.parse(&Cell::from("n/a")), None);
        assert_eq!(c.parse(&Cell::from("NaN")), None);
        assert_eq!(c.parse(&Cell::from("inf")), None);
        assert_eq!(c.parse(&Cell::from("1,0")), None);
        assert_eq!(c.parse_or_zero(&Cell::from("n/a")), 0.0);
    }

    #[test]
    fn accepts_numbers_and_thousands() {
        let c = NumericCoercer::new(&[]);
        assert_eq!(c.parse(&Cell::Number(12.5)), Some(12.5));
        assert_eq!(c.parse(&Cell::from("1,000")), Some(1000.0));
        assert_eq!(c.parse(&Cell::from("-12,345.5")), Some(-12345.5));
        assert_eq!(c.parse(&Cell::from(" 42 ")), Some(42.0));
        // without tags the marker is just text
        assert_eq!(c.parse(&Cell::from("NoPIN26 5")), None);
    }

    #[test]
    fn custom_tags_are_escaped() {
        let c = NumericCoercer::new(&["N/A*".to_string(), "ND".to_string()]);
        assert_eq!(c.parse(&Cell::from("N/A* 7")), Some(7.0));
        assert_eq!(c.parse(&Cell::from("ND\t8")), Some(8.0));
    }

    #[test]
    fn coerce_types_columns() {
        let t = SheetTable::new(
            vec!["P-Code".into(), "Final PiN".into()],
            vec![
                vec![Cell::from("MZ01"), Cell::from("-")],
                vec![Cell::Number(1203.0), Cell::from("oops")],
            ],
        );
        let out = NumericCoercer::default().coerce(&t, &["Final PiN".into(), "Absent".into()]);
        assert_eq!(out.numbers("Final PiN"), Some(&[Some(0.0), None][..]));
        assert_eq!(
            out.texts("P-Code"),
            Some(&[Some("MZ01".to_string()), Some("1203".to_string())][..])
        );
        assert!(!out.has("Absent"));
    }
}
