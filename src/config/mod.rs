pub mod resolver;
pub mod settings;
pub mod types;

pub use resolver::{normalize_iso, parse_config, ConfigResolver};
pub use settings::Settings;
pub use types::{
    ColumnSource, CountryConfig, DatasetKind, Geo, MappingEntry, Params, SheetId, NEW_SUFFIX,
    OLD_SUFFIX,
};
