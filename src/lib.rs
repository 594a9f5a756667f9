//! Configuration-driven ETL for humanitarian needs-assessment workbooks:
//! per-country sheets in, canonical area-level PiN, trend and severity
//! tables out, cached as Parquet snapshots.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod patch;
pub mod pipeline;
pub mod process;
pub mod sheet;
pub mod table;

pub use cache::{MemoryCache, NoCache, ParquetCache, SnapshotCache};
pub use config::{ConfigResolver, CountryConfig, DatasetKind, Settings};
pub use error::{EtlError, Result};
pub use pipeline::{DatasetService, PrecomputeSummary};
pub use table::{CanonicalRow, CanonicalTable};
