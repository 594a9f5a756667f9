use std::collections::HashMap;
use tracing::{debug, info};

use super::{CountryPatch, PatchContext};
use crate::config::{CountryConfig, DatasetKind};
use crate::error::{EtlError, Result};
use crate::process::derive_history;
use crate::table::names::NEW_PIN;
use crate::table::CanonicalTable;

/// Colombia's trend sheet ships without current-year sector figures and
/// keys areas by bare DANE municipal codes (`5001`). When `New PiN` comes
/// out as zero, fill `<sector> - new` from the canonical PiN table, whose
/// P-codes are `CO` + the code padded to five digits (`CO05001`).
#[derive(Debug, Clone)]
pub struct ColombiaHistoryPatch {
    prefix: &'static str,
    width: usize,
}

impl Default for ColombiaHistoryPatch {
    fn default() -> Self {
        Self {
            prefix: "CO",
            width: 5,
        }
    }
}

impl ColombiaHistoryPatch {
    /// Canonical P-code for a trend-sheet code. Codes already carrying the
    /// prefix are kept; anything else that is not all digits has no match.
    pub fn to_pcode(&self, code: &str) -> Option<String> {
        let code = code.trim();
        if code.starts_with(self.prefix) {
            return Some(code.to_string());
        }
        if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(format!("{}{:0>width$}", self.prefix, code, width = self.width))
    }

    fn new_pin_is_zero(table: &CanonicalTable) -> bool {
        table
            .numbers(NEW_PIN)
            .map_or(true, |v| v.iter().flatten().sum::<f64>() == 0.0)
    }
}

impl CountryPatch for ColombiaHistoryPatch {
    fn name(&self) -> &'static str {
        "colombia-history-new-pin"
    }

    fn applies(&self, kind: DatasetKind) -> bool {
        kind == DatasetKind::History
    }

    fn apply(&self, ctx: &PatchContext<'_>, table: &mut CanonicalTable) -> Result<bool> {
        if !Self::new_pin_is_zero(table) {
            return Ok(false);
        }
        let config = ctx.config;
        let geo = config.geo.pcode_col.as_str();
        let fail = |reason: String| EtlError::Patch {
            country: config.iso.clone(),
            reason,
        };

        let pin = ctx.pin_table()?;
        let pin_keys = pin
            .keys(geo)
            .ok_or_else(|| fail(format!("PiN table has no `{}` column", geo)))?;
        let index: HashMap<&str, usize> = pin_keys
            .iter()
            .enumerate()
            .filter_map(|(i, k)| k.as_deref().map(|k| (k, i)))
            .collect();

        let codes = table
            .keys(geo)
            .ok_or_else(|| fail(format!("trend table has no `{}` column", geo)))?;
        let matches: Vec<Option<usize>> = codes
            .iter()
            .map(|c| {
                c.as_deref()
                    .and_then(|c| self.to_pcode(c))
                    .and_then(|p| index.get(p.as_str()).copied())
            })
            .collect();
        let matched = matches.iter().flatten().count();
        if matched == 0 {
            return Err(fail("no trend-sheet area matched a PiN P-code".into()));
        }

        let mut patched = Vec::new();
        for sector in &config.sectors {
            if table.numbers(&CountryConfig::old_col(sector)).is_none() {
                continue;
            }
            let Some(source) = pin.numbers(sector) else {
                debug!(sector = %sector, "sector absent from PiN table; left unpatched");
                continue;
            };
            let values: Vec<Option<f64>> = matches.iter().map(|m| m.and_then(|j| source[j])).collect();
            table.put_numbers(&CountryConfig::new_col(sector), values);
            patched.push(sector.as_str());
        }
        if patched.is_empty() {
            return Err(fail("no sector could be filled from the PiN table".into()));
        }

        derive_history(table, &config.sectors);
        info!(
            country = %config.iso,
            matched,
            rows = table.len(),
            sectors = ?patched,
            "filled current-year sector figures from PiN table"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::table::names::{OLD_PIN, PIN_DELTA};
    use crate::table::Column;
    use std::path::Path;

    fn config() -> CountryConfig {
        parse_config(
            "COL",
            "file_path: col.xlsx\nsheets: {pin: PiN, history: Hist}\nsectors: [Health, WASH]\ngeo: {pcode_col: P-Code}\n",
            Path::new("."),
        )
        .unwrap()
    }

    fn pin() -> Result<CanonicalTable> {
        Ok(CanonicalTable::new(vec![
            Column::text("P-Code", vec![Some("CO05001".into()), Some("CO11001".into())]),
            Column::number("Health", vec![Some(40.0), Some(7.0)]),
            Column::number("WASH", vec![Some(10.0), None]),
        ])
        .unwrap())
    }

    fn history() -> CanonicalTable {
        let mut t = CanonicalTable::new(vec![
            Column::number("P-Code", vec![Some(5001.0), Some(11001.0), Some(99999.0)]),
            Column::number("Health - old", vec![Some(30.0), Some(7.0), Some(1.0)]),
            Column::number("Health - new", vec![Some(0.0), Some(0.0), Some(0.0)]),
            Column::number("WASH - old", vec![Some(5.0), Some(5.0), None]),
        ])
        .unwrap();
        derive_history(&mut t, &["Health".to_string(), "WASH".to_string()]);
        t
    }

    #[test]
    fn pads_and_prefixes_codes() {
        let p = ColombiaHistoryPatch::default();
        assert_eq!(p.to_pcode("5001").as_deref(), Some("CO05001"));
        assert_eq!(p.to_pcode(" 11001 ").as_deref(), Some("CO11001"));
        assert_eq!(p.to_pcode("CO05001").as_deref(), Some("CO05001"));
        assert_eq!(p.to_pcode("Medellín"), None);
    }

    #[test]
    fn fills_new_figures_and_recomputes_totals() -> anyhow::Result<()> {
        let cfg = config();
        let ctx = PatchContext::new(&cfg, DatasetKind::History, &pin);
        let mut t = history();
        assert!(ColombiaHistoryPatch::default().apply(&ctx, &mut t)?);

        assert_eq!(t.numbers("Health - new"), Some(&[Some(40.0), Some(7.0), None][..]));
        assert_eq!(t.numbers("WASH - new"), Some(&[Some(10.0), None, None][..]));
        assert_eq!(t.numbers(OLD_PIN), Some(&[Some(35.0), Some(12.0), Some(1.0)][..]));
        assert_eq!(t.numbers(NEW_PIN), Some(&[Some(50.0), Some(7.0), None][..]));
        assert_eq!(t.numbers(PIN_DELTA), Some(&[Some(15.0), Some(-5.0), None][..]));
        Ok(())
    }

    #[test]
    fn nonzero_new_pin_is_left_alone() -> anyhow::Result<()> {
        let cfg = config();
        let ctx = PatchContext::new(&cfg, DatasetKind::History, &pin);
        let mut t = history();
        t.put_numbers("Health - new", vec![Some(1.0), None, None]);
        derive_history(&mut t, &cfg.sectors);
        let before = t.clone();
        assert!(!ColombiaHistoryPatch::default().apply(&ctx, &mut t)?);
        assert_eq!(t, before);
        Ok(())
    }

    #[test]
    fn no_matching_area_is_a_patch_error() {
        let cfg = config();
        let other = || -> Result<CanonicalTable> {
            Ok(CanonicalTable::new(vec![
                Column::text("P-Code", vec![Some("CO00001".into())]),
                Column::number("Health", vec![Some(1.0)]),
            ])
            .unwrap())
        };
        let ctx = PatchContext::new(&cfg, DatasetKind::History, &other);
        let err = ColombiaHistoryPatch::default()
            .apply(&ctx, &mut history())
            .unwrap_err();
        assert!(matches!(err, EtlError::Patch { .. }));
    }
}
