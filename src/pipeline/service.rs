use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::build::process_grid;
use crate::cache::{ParquetCache, SnapshotCache};
use crate::config::{normalize_iso, ConfigResolver, CountryConfig, DatasetKind, Settings};
use crate::error::{EtlError, Result};
use crate::patch::{PatchContext, PatchRegistry};
use crate::sheet::{SheetSource, WorkbookLoader};
use crate::table::CanonicalTable;

/// The entry point consumers use: `load_dataset` and `get_sectors`.
///
/// Wraps every (country, kind) pipeline in the snapshot cache. A present
/// snapshot short-circuits the whole chain.
pub struct DatasetService {
    resolver: ConfigResolver,
    source: Box<dyn SheetSource>,
    cache: Box<dyn SnapshotCache>,
    patches: PatchRegistry,
}

impl DatasetService {
    pub fn new(
        resolver: ConfigResolver,
        source: Box<dyn SheetSource>,
        cache: Box<dyn SnapshotCache>,
        patches: PatchRegistry,
    ) -> Self {
        Self {
            resolver,
            source,
            cache,
            patches,
        }
    }

    /// Workbooks on disk, Parquet snapshots, built-in patches.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            ConfigResolver::new(&settings.config_dir, &settings.data_root),
            Box::new(WorkbookLoader),
            Box::new(ParquetCache::new(&settings.cache_dir)),
            PatchRegistry::builtin(),
        )
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    pub fn source(&self) -> &dyn SheetSource {
        self.source.as_ref()
    }

    pub fn cache(&self) -> &dyn SnapshotCache {
        self.cache.as_ref()
    }

    /// Read-through load of one canonical table.
    ///
    /// A failed snapshot write is logged; the freshly built table is still
    /// returned.
    #[instrument(level = "debug", skip(self))]
    pub fn load_dataset(&self, country: &str, kind: DatasetKind) -> Result<CanonicalTable> {
        let iso = normalize_iso(country);
        if let Some(table) = self.cache.get(&iso, kind)? {
            debug!(country = %iso, kind = %kind, "served from snapshot");
            return Ok(table);
        }

        let config = self.resolver.resolve(&iso)?;
        let table = self.build_dataset(&config, kind)?;
        if let Err(e) = self.cache.put(&iso, kind, &table) {
            warn!(country = %iso, kind = %kind, "snapshot not written: {}", e);
        }
        Ok(table)
    }

    pub fn get_sectors(&self, country: &str) -> Result<Vec<String>> {
        Ok(self.resolver.resolve(country)?.sectors.clone())
    }

    /// Run the full pipeline for `kind`, bypassing the cache for this
    /// dataset (a patch may still read other datasets through it).
    pub fn build_dataset(&self, config: &Arc<CountryConfig>, kind: DatasetKind) -> Result<CanonicalTable> {
        let sheet = config.sheet(kind).ok_or_else(|| EtlError::SheetNotConfigured {
            country: config.iso.clone(),
            kind,
        })?;
        let grid = self.source.load_sheet(&config.file_path, sheet)?;
        let (table, report) = process_grid(config, kind, &grid);
        if !report.skipped.is_empty() {
            info!(
                country = %config.iso,
                kind = %kind,
                skipped = report.skipped.len(),
                "some column mappings had no source column"
            );
        }

        let pin = || self.load_dataset(&config.iso, DatasetKind::Pin);
        let ctx = PatchContext::new(config, kind, &pin);
        Ok(self.patches.apply(&ctx, table))
    }
}
