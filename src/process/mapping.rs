use std::collections::HashMap;
use tracing::{debug, warn};

use super::coerce::NumericCoercer;
use crate::config::{ColumnSource, CountryConfig, DatasetKind};
use crate::sheet::Cell;
use crate::table::SheetTable;

/// A mapping entry none of whose source columns exist in the sheet.
/// Recovered locally: the entry is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMismatch {
    pub canonical: String,
    pub sources: Vec<String>,
}

/// How one `column_mapping` entry is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingRule {
    /// Each listed source column is renamed to the canonical name.
    Rename { canonical: String, sources: Vec<String> },
    /// The listed source columns are summed into a new canonical column.
    Sum { canonical: String, sources: Vec<String> },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingReport {
    pub renamed: Vec<(String, String)>,
    pub summed: Vec<String>,
    pub coalesced: Vec<String>,
    /// Sum-group member columns removed once their group was totalled.
    pub dropped: Vec<String>,
    pub skipped: Vec<SchemaMismatch>,
}

/// Whether a list-valued mapping targets a sector-like (additive) measure.
pub fn is_sector_like(config: &CountryConfig, kind: DatasetKind, canonical: &str) -> bool {
    config.is_sector(canonical)
        || (kind == DatasetKind::History && config.is_history_sector(canonical))
}

/// Classify every mapping entry. A list targeting a sector-like name is a
/// sum group; any other list is a set of aliases for one column.
pub fn plan(config: &CountryConfig, kind: DatasetKind) -> Vec<MappingRule> {
    config
        .column_mapping
        .iter()
        .map(|entry| {
            let canonical = entry.canonical.clone();
            match &entry.source {
                ColumnSource::Single(s) => MappingRule::Rename {
                    canonical,
                    sources: vec![s.clone()],
                },
                ColumnSource::Many(list) if is_sector_like(config, kind, &entry.canonical) => {
                    MappingRule::Sum {
                        canonical,
                        sources: list.clone(),
                    }
                }
                ColumnSource::Many(list) => MappingRule::Rename {
                    canonical,
                    sources: list.clone(),
                },
            }
        })
        .collect()
}

/// Rename and merge source columns onto canonical names.
///
/// Renames are applied simultaneously against the sheet's own labels (the
/// first rule naming a source wins). Columns that end up sharing a label
/// are coalesced into the first. Sum groups are then evaluated over the
/// renamed table, treating unparseable members as zero; the member
/// columns are then dropped so only the total reaches the canonical table.
pub fn map_schema(
    config: &CountryConfig,
    kind: DatasetKind,
    mut table: SheetTable,
    coercer: &NumericCoercer,
) -> (SheetTable, MappingReport) {
    let rules = plan(config, kind);
    let mut report = MappingReport::default();

    // 1) renames
    let mut renames: HashMap<&str, &str> = HashMap::new();
    for rule in &rules {
        if let MappingRule::Rename { canonical, sources } = rule {
            let present: Vec<&String> = sources.iter().filter(|s| table.has(s)).collect();
            if present.is_empty() {
                report.skipped.push(SchemaMismatch {
                    canonical: canonical.clone(),
                    sources: sources.clone(),
                });
                continue;
            }
            for s in present {
                renames.entry(s.as_str()).or_insert(canonical.as_str());
            }
        }
    }

    let planned: Vec<(usize, String)> = table
        .labels()
        .iter()
        .enumerate()
        .filter_map(|(idx, label)| {
            renames
                .get(label.as_str())
                .filter(|target| **target != label.as_str())
                .map(|target| (idx, target.to_string()))
        })
        .collect();
    for (idx, target) in planned {
        report
            .renamed
            .push((table.labels()[idx].clone(), target.clone()));
        table.set_label(idx, target);
    }
    report.coalesced = table.coalesce_duplicate_labels();

    // 2) sum groups
    for rule in &rules {
        if let MappingRule::Sum { canonical, sources } = rule {
            let positions: Vec<usize> = sources.iter().filter_map(|s| table.position(s)).collect();
            if positions.is_empty() {
                report.skipped.push(SchemaMismatch {
                    canonical: canonical.clone(),
                    sources: sources.clone(),
                });
                continue;
            }
            let sums: Vec<Cell> = table
                .rows()
                .iter()
                .map(|row| {
                    let total: f64 = positions.iter().map(|&p| coercer.parse_or_zero(&row[p])).sum();
                    Cell::Number(total)
                })
                .collect();
            table.put_column(canonical, sums);
            report.summed.push(canonical.clone());
        }
    }

    // 3) members go once every group is totalled; a member may feed several
    for rule in &rules {
        if let MappingRule::Sum { sources, .. } = rule {
            for source in sources {
                if report.summed.contains(source) || report.dropped.contains(source) {
                    continue;
                }
                if table.remove_column(source) {
                    report.dropped.push(source.clone());
                }
            }
        }
    }

    for miss in &report.skipped {
        debug!(
            country = %config.iso,
            kind = %kind,
            canonical = %miss.canonical,
            sources = ?miss.sources,
            "mapping skipped, no source column present"
        );
    }
    if !report.coalesced.is_empty() {
        warn!(
            country = %config.iso,
            kind = %kind,
            columns = ?report.coalesced,
            "several source columns mapped to one label; coalesced"
        );
    }
    (table, report)
}
