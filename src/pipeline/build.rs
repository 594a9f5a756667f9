use tracing::{debug, instrument};

use crate::config::{CountryConfig, DatasetKind};
use crate::process::{
    aggregate_by_area, derive_history, derive_pin, derive_severity, map_schema, merges_rows,
    normalize, AggregationPolicy, MappingReport, NumericCoercer,
};
use crate::sheet::RawGrid;
use crate::table::names::{sector_share, FINAL_PIN, FINAL_SEVERITY, POPULATION};
use crate::table::{CanonicalTable, SheetTable};

/// Labels coerced to numbers for `kind`. Everything else stays text.
pub fn numeric_columns(config: &CountryConfig, kind: DatasetKind, sheet: &SheetTable) -> Vec<String> {
    let mut cols: Vec<String> = match kind {
        DatasetKind::Pin => {
            let mut cols = vec![FINAL_PIN.to_string(), POPULATION.to_string()];
            cols.extend(config.sectors.iter().cloned());
            cols.extend(config.sectors.iter().map(|s| sector_share(s)));
            cols
        }
        DatasetKind::History => config
            .sectors
            .iter()
            .flat_map(|s| [CountryConfig::old_col(s), CountryConfig::new_col(s)])
            .collect(),
        DatasetKind::Severity => {
            let mut cols = config.sectors.clone();
            cols.push(FINAL_SEVERITY.to_string());
            cols
        }
    };
    cols.retain(|c| sheet.has(c));
    cols
}

/// Severity ordinals validated to 1..=5.
fn ordinal_columns(config: &CountryConfig) -> Vec<String> {
    let mut cols = config.sectors.clone();
    cols.push(FINAL_SEVERITY.to_string());
    cols
}

/// The pure part of a pipeline run: raw grid in, canonical table out
/// (before any country patch).
#[instrument(level = "debug", skip(config, grid), fields(country = %config.iso))]
pub fn process_grid(config: &CountryConfig, kind: DatasetKind, grid: &RawGrid) -> (CanonicalTable, MappingReport) {
    let coercer = NumericCoercer::new(&config.params.no_data_tags);
    let sheet = normalize(grid, config.params.header_row, config.params.start_row);
    let (sheet, report) = map_schema(config, kind, sheet, &coercer);
    let numeric = numeric_columns(config, kind, &sheet);
    let table = coercer.coerce(&sheet, &numeric);

    let geo = config.geo.pcode_col.as_str();
    let group = config.geo.group_col.as_str();
    let table = match kind {
        DatasetKind::Pin => {
            let mut table = table;
            if merges_rows(&table, geo, group) {
                // shares do not add up; they are rederived from the summed sectors
                for sector in &config.sectors {
                    table.remove(&sector_share(sector));
                }
            }
            let mut t = aggregate_by_area(table, geo, group, AggregationPolicy::Sum);
            derive_pin(&mut t, &config.sectors);
            t
        }
        DatasetKind::History => {
            let mut t = aggregate_by_area(table, geo, group, AggregationPolicy::Sum);
            derive_history(&mut t, &config.sectors);
            t
        }
        DatasetKind::Severity => derive_severity(table, geo, &ordinal_columns(config)),
    };
    debug!(kind = %kind, rows = table.len(), columns = table.columns().len(), "built canonical table");
    (table, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::sheet::Cell;
    use crate::table::names::{NEW_PIN, OLD_PIN, PCT_PIN, PIN_DELTA};
    use std::collections::HashSet;
    use std::path::Path;

    fn config() -> CountryConfig {
        parse_config(
            "MOZ",
            r#"
name: Mozambique
file_path: moz.xlsx
sheets: {pin: PiN, history: Trend, severity: Sev}
params: {header_row: 1, start_row: 2}
column_mapping:
  Final PiN: ["Final PiN (old)", "Final_PiN_Old"]
  Health: ["Health - Camp", "Health - Host"]
sectors: [Health, WASH]
geo: {pcode_col: Admin 2 P-Code}
"#,
            Path::new("."),
        )
        .unwrap()
    }

    fn grid(rows: Vec<Vec<Cell>>) -> RawGrid {
        let mut all = vec![vec!["Worksheet 3A".into()]];
        all.extend(rows);
        RawGrid::new(all)
    }

    #[test]
    fn pin_sums_sector_group_across_population_groups() {
        let g = grid(vec![
            vec![
                "Admin 1".into(),
                "Admin 2 P-Code".into(),
                "Population Group".into(),
                "Population".into(),
                "Final_PiN_Old".into(),
                "Health - Camp".into(),
                "Health - Host".into(),
                "WASH".into(),
            ],
            vec![
                "Niassa".into(), "MZ0101".into(), "IDP".into(), 100.0.into(), "NoPIN26 40".into(),
                "1,000".into(), "-".into(), "-".into(),
            ],
            vec![
                "Niassa".into(), "MZ0101".into(), "Host".into(), 300.0.into(), 60.0.into(),
                5.0.into(), 7.0.into(), Cell::Empty,
            ],
            vec![
                "Tete".into(), "MZ0201".into(), "Host".into(), 0.0.into(), 10.0.into(),
                Cell::Empty, Cell::Empty, "n/a".into(),
            ],
            vec!["Total".into(), Cell::Empty, Cell::Empty, 400.0.into(), 110.0.into()],
        ]);
        let (t, report) = process_grid(&config(), DatasetKind::Pin, &g);

        assert_eq!(t.len(), 2);
        let keys: HashSet<_> = t.keys("Admin 2 P-Code").unwrap().into_iter().collect();
        assert_eq!(keys.len(), 2);

        assert_eq!(t.numbers("Health"), Some(&[Some(1012.0), Some(0.0)][..]));
        assert_eq!(t.numbers(FINAL_PIN), Some(&[Some(100.0), Some(10.0)][..]));
        assert_eq!(t.numbers(POPULATION), Some(&[Some(400.0), Some(0.0)][..]));
        assert_eq!(t.numbers(PCT_PIN), Some(&[Some(0.25), None][..]));
        // hyphen is an explicit zero, garbage is missing
        assert_eq!(t.numbers("WASH"), Some(&[Some(0.0), None][..]));
        assert_eq!(t.numbers("WASH%"), Some(&[Some(0.0), None][..]));
        assert!(!t.has("Population Group"));
        assert_eq!(report.summed, vec!["Health".to_string()]);
        // the members fed the total and are gone, artifacts included
        assert!(!t.has("Health - Camp"));
        assert!(!t.has("Health - Host"));
    }

    #[test]
    fn sheet_shares_are_rederived_after_group_sum() {
        let g = grid(vec![
            vec![
                "Admin 2 P-Code".into(),
                "Population Group".into(),
                "Population".into(),
                "WASH".into(),
                "WASH%".into(),
            ],
            vec!["MZ01".into(), "IDP".into(), 100.0.into(), 60.0.into(), 0.6.into()],
            vec!["MZ01".into(), "Host".into(), 100.0.into(), 70.0.into(), 0.7.into()],
        ]);
        let (t, _) = process_grid(&config(), DatasetKind::Pin, &g);
        assert_eq!(t.numbers("WASH"), Some(&[Some(130.0)][..]));
        assert_eq!(t.numbers("WASH%"), Some(&[Some(0.65)][..]));
    }

    #[test]
    fn sheet_shares_survive_when_no_rows_merge() {
        let g = grid(vec![
            vec![
                "Admin 2 P-Code".into(),
                "Population Group".into(),
                "Population".into(),
                "WASH".into(),
                "WASH%".into(),
            ],
            vec!["MZ01".into(), "IDP".into(), 100.0.into(), 60.0.into(), 0.5.into()],
            vec!["MZ02".into(), "Host".into(), 100.0.into(), 70.0.into(), 0.7.into()],
        ]);
        let (t, _) = process_grid(&config(), DatasetKind::Pin, &g);
        assert_eq!(t.numbers("WASH%"), Some(&[Some(0.5), Some(0.7)][..]));
    }

    #[test]
    fn history_derives_totals_over_paired_sectors() {
        let g = grid(vec![
            vec![
                "Admin 2 P-Code".into(),
                "Health - old".into(),
                "Health - new".into(),
                "WASH - old".into(),
            ],
            vec!["MZ0101".into(), 100.0.into(), 80.0.into(), 999.0.into()],
            vec!["MZ0102".into(), 0.0.into(), "-".into(), 1.0.into()],
        ]);
        let (t, _) = process_grid(&config(), DatasetKind::History, &g);
        assert_eq!(t.numbers(OLD_PIN), Some(&[Some(100.0), Some(0.0)][..]));
        assert_eq!(t.numbers(NEW_PIN), Some(&[Some(80.0), Some(0.0)][..]));
        assert_eq!(t.numbers(PIN_DELTA), Some(&[Some(-20.0), Some(0.0)][..]));
    }

    #[test]
    fn severity_keeps_first_row_per_area() {
        let g = grid(vec![
            vec!["Admin 2 P-Code".into(), "Health".into(), "Final Severity".into()],
            vec!["MZ0101".into(), 3.0.into(), 3.0.into()],
            vec!["MZ0101".into(), 4.0.into(), 4.0.into()],
            vec![Cell::Empty, 5.0.into(), 5.0.into()],
            vec!["MZ0102".into(), "7".into(), 2.0.into()],
        ]);
        let (t, _) = process_grid(&config(), DatasetKind::Severity, &g);
        assert_eq!(t.len(), 2);
        assert_eq!(t.numbers("Health"), Some(&[Some(3.0), None][..]));
        assert_eq!(t.numbers(FINAL_SEVERITY), Some(&[Some(3.0), Some(2.0)][..]));
    }
}
