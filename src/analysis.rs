//! Row-level views over canonical tables used by the page layer.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use crate::table::names::{sector_share, FINAL_SEVERITY, PCT_PIN, SEVERITY};
use crate::table::CanonicalTable;

/// Per row, how many of `columns` hold a value strictly above `threshold`.
/// Missing values and absent columns never count.
pub fn sectors_above_threshold(table: &CanonicalTable, columns: &[String], threshold: f64) -> Vec<usize> {
    let cols: Vec<&[Option<f64>]> = columns.iter().filter_map(|c| table.numbers(c)).collect();
    (0..table.len())
        .map(|i| {
            cols.iter()
                .filter(|c| c[i].map_or(false, |v| v > threshold))
                .count()
        })
        .collect()
}

/// `<sector>%` names for the PiN table.
pub fn share_columns(sectors: &[String]) -> Vec<String> {
    sectors.iter().map(|s| sector_share(s)).collect()
}

/// Left-join the area severity onto the PiN table as `Severity`.
///
/// Uses the severity table's `Final Severity`, falling back to its
/// `Severity`. The PiN table is returned as-is when it already carries
/// `Severity` or when either side lacks what the join needs.
pub fn merge_severity(pin: &CanonicalTable, sev: &CanonicalTable, geo_key: &str) -> CanonicalTable {
    let mut out = pin.clone();
    if pin.has(SEVERITY) {
        return out;
    }
    let Some(values) = sev.numbers(FINAL_SEVERITY).or_else(|| sev.numbers(SEVERITY)) else {
        warn!("severity table has no numeric severity column; nothing to merge");
        return out;
    };
    let (Some(pin_keys), Some(sev_keys)) = (pin.keys(geo_key), sev.keys(geo_key)) else {
        warn!(geo_key, "geo key missing from one side; severity not merged");
        return out;
    };

    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, k) in sev_keys.iter().enumerate() {
        if let Some(k) = k {
            index.entry(k.as_str()).or_insert(i);
        }
    }
    let merged: Vec<Option<f64>> = pin_keys
        .iter()
        .map(|k| k.as_deref().and_then(|k| index.get(k)).and_then(|&j| values[j]))
        .collect();
    out.put_numbers(SEVERITY, merged);
    out
}

/// Where an area falls against a PiN-share and a severity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Overlap {
    Both,
    PinOnly,
    SeverityOnly,
    Neither,
}

impl Overlap {
    pub fn label(&self) -> &'static str {
        match self {
            Overlap::Both => "Both",
            Overlap::PinOnly => "PiN Only",
            Overlap::SeverityOnly => "Severity Only",
            Overlap::Neither => "None",
        }
    }
}

impl fmt::Display for Overlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds are inclusive; a missing value is never "high".
pub fn classify_overlap(pct_pin: Option<f64>, severity: Option<f64>, pin_threshold: f64, sev_threshold: f64) -> Overlap {
    let pin_high = pct_pin.map_or(false, |v| v >= pin_threshold);
    let sev_high = severity.map_or(false, |v| v >= sev_threshold);
    match (pin_high, sev_high) {
        (true, true) => Overlap::Both,
        (true, false) => Overlap::PinOnly,
        (false, true) => Overlap::SeverityOnly,
        (false, false) => Overlap::Neither,
    }
}

/// `classify_overlap` for every row of a PiN table that has been through
/// [`merge_severity`].
pub fn overlap_categories(table: &CanonicalTable, pin_threshold: f64, sev_threshold: f64) -> Vec<Overlap> {
    table
        .rows()
        .map(|r| classify_overlap(r.number(PCT_PIN), r.number(SEVERITY), pin_threshold, sev_threshold))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    fn pin() -> CanonicalTable {
        CanonicalTable::new(vec![
            Column::text("Admin 2 P-Code", vec![s("MZ01"), s("MZ02"), s("MZ03")]),
            Column::number(PCT_PIN, vec![Some(0.8), Some(0.2), None]),
            Column::number("Health%", vec![Some(0.9), Some(0.75), None]),
            Column::number("WASH%", vec![Some(0.76), None, Some(1.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn counts_sectors_strictly_above() {
        let cols = share_columns(&["Health".to_string(), "WASH".to_string(), "CCCM".to_string()]);
        assert_eq!(sectors_above_threshold(&pin(), &cols, 0.75), vec![2, 0, 1]);
    }

    #[test]
    fn merges_final_severity_by_key() {
        let sev = CanonicalTable::new(vec![
            Column::text("Admin 2 P-Code", vec![s("MZ02"), s("MZ01")]),
            Column::number(FINAL_SEVERITY, vec![Some(2.0), Some(4.0)]),
            Column::number(SEVERITY, vec![Some(5.0), Some(5.0)]),
        ])
        .unwrap();
        let merged = merge_severity(&pin(), &sev, "Admin 2 P-Code");
        assert_eq!(merged.numbers(SEVERITY), Some(&[Some(4.0), Some(2.0), None][..]));

        let cats = overlap_categories(&merged, 0.6, 4.0);
        assert_eq!(cats, vec![Overlap::Both, Overlap::Neither, Overlap::Neither]);
    }

    #[test]
    fn merge_is_a_no_op_without_severity_column() {
        let sev = CanonicalTable::new(vec![Column::text("Admin 2 P-Code", vec![s("MZ01")])]).unwrap();
        assert_eq!(merge_severity(&pin(), &sev, "Admin 2 P-Code"), pin());
    }

    #[test]
    fn overlap_thresholds_are_inclusive() {
        assert_eq!(classify_overlap(Some(0.6), Some(3.0), 0.6, 4.0), Overlap::PinOnly);
        assert_eq!(classify_overlap(Some(0.1), Some(4.0), 0.6, 4.0), Overlap::SeverityOnly);
        assert_eq!(classify_overlap(None, None, 0.0, 0.0), Overlap::Neither);
        assert_eq!(Overlap::Neither.to_string(), "None");
    }
}
