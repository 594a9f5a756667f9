use anyhow::Context;
use chrono::Utc;
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    file::properties::WriterProperties,
    format::KeyValue,
};
use std::{
    collections::HashMap,
    fs::{self, File},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};
use tracing::{debug, info, warn};

use super::arrow::{from_batches, to_record_batch};
use super::SnapshotCache;
use crate::config::{normalize_iso, DatasetKind};
use crate::error::{EtlError, Result};
use crate::table::CanonicalTable;

pub const META_COUNTRY: &str = "pinscraper.country";
pub const META_KIND: &str = "pinscraper.kind";
pub const META_WRITTEN_AT: &str = "pinscraper.written_at";

type Key = (String, DatasetKind);

/// Parquet snapshots under `<root>/<ISO>/{pin,hist,sev}.parquet`.
///
/// Writers go through a per-(country, kind) lock and publish with a
/// tmp-file rename, so a reader sees either the old snapshot, the new one,
/// or none.
pub struct ParquetCache {
    root: PathBuf,
    locks: Mutex<HashMap<Key, Arc<Mutex<()>>>>,
}

impl ParquetCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, country: &str, kind: DatasetKind) -> PathBuf {
        self.root
            .join(normalize_iso(country))
            .join(format!("{}.parquet", kind.snapshot_stem()))
    }

    fn key_lock(&self, country: &str, kind: DatasetKind) -> Arc<Mutex<()>> {
        let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry((normalize_iso(country), kind)).or_default())
    }

    fn write_file(&self, path: &Path, country: &str, kind: DatasetKind, table: &CanonicalTable) -> anyhow::Result<()> {
        let batch = to_record_batch(table)?;
        let metadata = vec![
            KeyValue::new(META_COUNTRY.to_string(), normalize_iso(country)),
            KeyValue::new(META_KIND.to_string(), kind.as_str().to_string()),
            KeyValue::new(META_WRITTEN_AT.to_string(), Utc::now().to_rfc3339()),
        ];
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .set_key_value_metadata(Some(metadata))
            .build();

        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
            .context("creating ArrowWriter")?;
        writer.write(&batch).context("writing snapshot batch")?;
        writer.close().context("closing ArrowWriter")?;
        Ok(())
    }
}

impl SnapshotCache for ParquetCache {
    fn get(&self, country: &str, kind: DatasetKind) -> Result<Option<CanonicalTable>> {
        let path = self.path_for(country, kind);
        if !path.is_file() {
            return Ok(None);
        }
        let read = || -> anyhow::Result<CanonicalTable> {
            let file = File::open(&path)?;
            let builder = ParquetRecordBatchReaderBuilder::try_new(file)
                .context("opening snapshot reader")?;
            let schema = builder.schema().clone();
            let batches = builder
                .build()
                .context("building snapshot reader")?
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("reading snapshot batches")?;
            from_batches(&schema, &batches)
        };
        let table = read().map_err(|e| EtlError::cache(&path, e))?;
        debug!(path = %path.display(), rows = table.len(), "snapshot hit");
        Ok(Some(table))
    }

    fn put(&self, country: &str, kind: DatasetKind, table: &CanonicalTable) -> Result<()> {
        let path = self.path_for(country, kind);
        let lock = self.key_lock(country, kind);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("parquet.tmp");
        if let Err(e) = self.write_file(&tmp, country, kind, table) {
            let _ = fs::remove_file(&tmp);
            return Err(EtlError::cache(&path, e));
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(EtlError::cache(&path, e));
        }
        info!(path = %path.display(), rows = table.len(), "wrote snapshot");
        Ok(())
    }

    fn invalidate(&self, country: &str, kind: DatasetKind) -> Result<bool> {
        let path = self.path_for(country, kind);
        let lock = self.key_lock(country, kind);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "removed snapshot");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                warn!(path = %path.display(), "cannot remove snapshot: {}", e);
                Err(e.into())
            }
        }
    }
}
