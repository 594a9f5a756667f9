//! Wires config, sheet source, processing stages, patches and the snapshot
//! cache into the `load_dataset` / `get_sectors` entry points.

pub mod build;
pub mod precompute;
pub mod service;

pub use build::{numeric_columns, process_grid};
pub use precompute::{CountrySummary, Outcome, PrecomputeSummary};
pub use service::DatasetService;
