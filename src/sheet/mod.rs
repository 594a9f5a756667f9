pub mod grid;
pub mod memory;
pub mod workbook;

use std::path::Path;

use crate::config::SheetId;
use crate::error::Result;

pub use grid::{format_number, Cell, RawGrid};
pub use memory::MemorySheets;
pub use workbook::WorkbookLoader;

/// "Give me sheet S of file F as an untyped grid of cells."
pub trait SheetSource: Send + Sync {
    /// Fails with `SourceUnavailable` when the file or sheet cannot be opened.
    fn load_sheet(&self, path: &Path, sheet: &SheetId) -> Result<RawGrid>;

    /// Whether the source file is present at all.
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
