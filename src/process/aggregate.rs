use std::collections::HashMap;
use tracing::{debug, warn};

use crate::table::{CanonicalTable, Column, ColumnData};

/// How rows sharing an area are collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationPolicy {
    /// Sum every numeric measure across population groups.
    Sum,
    /// Keep the first row seen for each area.
    FirstOccurrence,
}

/// Drop rows whose geo key is missing or blank. A table without the geo
/// column is returned untouched.
pub fn drop_missing_keys(table: CanonicalTable, geo_key: &str) -> CanonicalTable {
    let Some(keys) = table.keys(geo_key) else {
        warn!(geo_key, "geo key column absent; rows cannot be keyed");
        return table;
    };
    let keep: Vec<usize> = keys
        .iter()
        .enumerate()
        .filter_map(|(i, k)| k.as_ref().map(|_| i))
        .collect();
    if keep.len() == table.len() {
        return table;
    }
    debug!(geo_key, dropped = table.len() - keep.len(), "dropped rows without geo key");
    table.select_rows(&keep)
}

/// Group row indices by geo key, in first-appearance order.
fn groups(keys: &[Option<String>]) -> Vec<Vec<usize>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<Vec<usize>> = Vec::new();
    for (row, key) in keys.iter().enumerate() {
        let Some(key) = key.as_deref() else { continue };
        match index.get(key) {
            Some(&g) => out[g].push(row),
            None => {
                index.insert(key, out.len());
                out.push(vec![row]);
            }
        }
    }
    out
}

/// Whether a `Sum` aggregation over `group_col` would merge any rows.
pub fn merges_rows(table: &CanonicalTable, geo_key: &str, group_col: &str) -> bool {
    if !table.has(group_col) {
        return false;
    }
    let Some(keys) = table.keys(geo_key) else {
        return false;
    };
    let keyed = keys.iter().filter(|k| k.is_some()).count();
    groups(&keys).len() < keyed
}

/// Collapse population-group rows to one row per area.
///
/// Rows without a geo key are dropped first. With `Sum`, grouping only
/// happens when `group_col` is present; numeric measures are summed over
/// the present values (all-missing stays missing), descriptive columns take
/// the group's first row, and `group_col` itself is removed. With
/// `FirstOccurrence` the first row of each area is kept as-is.
pub fn aggregate_by_area(
    table: CanonicalTable,
    geo_key: &str,
    group_col: &str,
    policy: AggregationPolicy,
) -> CanonicalTable {
    if !table.has(geo_key) {
        warn!(geo_key, "geo key column absent; skipping area aggregation");
        return table;
    }
    let table = drop_missing_keys(table, geo_key);
    let keys = table.keys(geo_key).unwrap_or_default();
    let groups = groups(&keys);

    match policy {
        AggregationPolicy::FirstOccurrence => {
            if groups.len() == table.len() {
                return table;
            }
            let firsts: Vec<usize> = groups.iter().map(|g| g[0]).collect();
            debug!(
                geo_key,
                duplicates = table.len() - firsts.len(),
                "kept first row per area"
            );
            table.select_rows(&firsts)
        }
        AggregationPolicy::Sum => {
            if !table.has(group_col) {
                return table;
            }
            let mut out = CanonicalTable::with_len(groups.len());
            for col in table.columns() {
                if col.name == group_col {
                    continue;
                }
                let data = match &col.data {
                    ColumnData::Number(v) => ColumnData::Number(
                        groups.iter().map(|g| sum_present(g.iter().map(|&i| v[i]))).collect(),
                    ),
                    ColumnData::Text(v) => {
                        ColumnData::Text(groups.iter().map(|g| v[g[0]].clone()).collect())
                    }
                };
                out.put(Column {
                    name: col.name.clone(),
                    data,
                });
            }
            debug!(geo_key, rows = table.len(), areas = out.len(), "aggregated population groups");
            out
        }
    }
}

/// Sum of the present values; `None` when every value is missing.
pub fn sum_present(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    values
        .into_iter()
        .flatten()
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}
