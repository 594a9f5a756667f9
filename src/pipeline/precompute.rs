use rayon::prelude::*;
use std::fmt;
use std::time::Instant;
use tracing::{error, info, warn};

use super::service::DatasetService;
use crate::config::{normalize_iso, DatasetKind};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Written { rows: usize },
    /// A snapshot already existed and was left alone.
    Cached,
    Skipped(String),
    Failed(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Written { rows } => write!(f, "written ({} rows)", rows),
            Outcome::Cached => f.write_str("cached"),
            Outcome::Skipped(why) => write!(f, "skipped: {}", why),
            Outcome::Failed(why) => write!(f, "FAILED: {}", why),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountrySummary {
    pub country: String,
    /// Why the whole country was skipped (no config, no source file).
    pub skipped: Option<String>,
    pub datasets: Vec<(DatasetKind, Outcome)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecomputeSummary {
    pub countries: Vec<CountrySummary>,
}

impl PrecomputeSummary {
    fn outcomes(&self) -> impl Iterator<Item = &Outcome> {
        self.countries.iter().flat_map(|c| c.datasets.iter().map(|(_, o)| o))
    }

    pub fn written(&self) -> usize {
        self.outcomes().filter(|o| matches!(o, Outcome::Written { .. })).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes().filter(|o| matches!(o, Outcome::Failed(_))).count()
    }
}

impl DatasetService {
    /// Build and store every dataset for `countries` (all configured
    /// countries when empty). Countries run in parallel; a failing dataset
    /// never stops the others. `force` deletes existing snapshots first.
    pub fn precompute(&self, countries: &[String], force: bool) -> Result<PrecomputeSummary> {
        let start = Instant::now();
        let countries: Vec<String> = if countries.is_empty() {
            self.resolver().countries()?
        } else {
            countries.iter().map(|c| normalize_iso(c)).collect()
        };
        if countries.is_empty() {
            warn!(dir = %self.resolver().dir().display(), "no country configurations found");
        }

        let summaries: Vec<CountrySummary> = countries
            .par_iter()
            .map(|iso| self.precompute_country(iso, force))
            .collect();
        let summary = PrecomputeSummary { countries: summaries };
        info!(
            countries = summary.countries.len(),
            written = summary.written(),
            failed = summary.failed(),
            elapsed = ?start.elapsed(),
            "precompute complete"
        );
        Ok(summary)
    }

    fn precompute_country(&self, iso: &str, force: bool) -> CountrySummary {
        let mut summary = CountrySummary {
            country: iso.to_string(),
            skipped: None,
            datasets: Vec::new(),
        };

        let config = match self.resolver().resolve(iso) {
            Ok(c) => c,
            Err(e) => {
                warn!(country = %iso, "skipping: {}", e);
                summary.skipped = Some(e.to_string());
                return summary;
            }
        };
        if !self.source().exists(&config.file_path) {
            warn!(country = %iso, path = %config.file_path.display(), "skipping: source file not found");
            summary.skipped = Some(format!("source file {} not found", config.file_path.display()));
            return summary;
        }

        // PiN first: other datasets' patches may read it
        for kind in DatasetKind::ALL {
            let outcome = self.precompute_dataset(iso, kind, force);
            match &outcome {
                Outcome::Failed(why) => error!(country = %iso, kind = %kind, "dataset failed: {}", why),
                other => info!(country = %iso, kind = %kind, "{}", other),
            }
            summary.datasets.push((kind, outcome));
        }
        summary
    }

    fn precompute_dataset(&self, iso: &str, kind: DatasetKind, force: bool) -> Outcome {
        let config = match self.resolver().resolve(iso) {
            Ok(c) => c,
            Err(e) => return Outcome::Failed(e.to_string()),
        };
        if config.sheet(kind).is_none() {
            return Outcome::Skipped("no sheet configured".into());
        }
        if force {
            if let Err(e) = self.cache().invalidate(iso, kind) {
                return Outcome::Failed(e.to_string());
            }
        }
        match self.cache().get(iso, kind) {
            Ok(Some(_)) => return Outcome::Cached,
            Ok(None) => {}
            Err(e) => return Outcome::Failed(e.to_string()),
        }

        let table = match self.build_dataset(&config, kind) {
            Ok(t) => t,
            Err(e) => return Outcome::Failed(e.to_string()),
        };
        match self.cache().put(iso, kind, &table) {
            Ok(()) => Outcome::Written { rows: table.len() },
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}
