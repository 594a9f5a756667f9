//! The transformation stages between a raw grid and a canonical table:
//! header normalisation, schema mapping, numeric coercion, area
//! aggregation and derived metrics.

pub mod aggregate;
pub mod coerce;
pub mod derive;
pub mod mapping;
pub mod normalize;

pub use aggregate::{aggregate_by_area, drop_missing_keys, merges_rows, sum_present, AggregationPolicy};
pub use coerce::NumericCoercer;
pub use derive::{derive_history, derive_pin, derive_severity, paired_sectors, ratio};
pub use mapping::{map_schema, plan, MappingReport, MappingRule, SchemaMismatch};
pub use normalize::normalize;
