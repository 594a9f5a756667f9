//! Snapshot storage keyed by (country, dataset kind). A present snapshot
//! is authoritative: there is no TTL and no content hash, only explicit
//! invalidation.

pub mod arrow;
pub mod memory;
pub mod parquet;

pub use self::memory::{MemoryCache, NoCache};
pub use self::parquet::ParquetCache;

use crate::config::DatasetKind;
use crate::error::Result;
use crate::table::CanonicalTable;

pub trait SnapshotCache: Send + Sync {
    fn get(&self, country: &str, kind: DatasetKind) -> Result<Option<CanonicalTable>>;

    fn put(&self, country: &str, kind: DatasetKind, table: &CanonicalTable) -> Result<()>;

    /// Delete the snapshot; `Ok(false)` when there was none.
    fn invalidate(&self, country: &str, kind: DatasetKind) -> Result<bool>;
}
