pub mod canonical;
pub mod names;
pub mod sheet_table;

pub use canonical::{CanonicalRow, CanonicalTable, Column, ColumnData, TableShapeError};
pub use sheet_table::SheetTable;
