use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use super::grid::RawGrid;
use super::SheetSource;
use crate::config::SheetId;
use crate::error::{EtlError, Result};

/// Grids registered up front, keyed by (file, sheet). Used where no
/// workbook file exists, e.g. in tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySheets {
    sheets: HashMap<(PathBuf, String), RawGrid>,
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, sheet: &SheetId, grid: RawGrid) {
        self.sheets.insert((path.into(), sheet.to_string()), grid);
    }

    pub fn with(mut self, path: impl Into<PathBuf>, sheet: &SheetId, grid: RawGrid) -> Self {
        self.insert(path, sheet, grid);
        self
    }
}

impl SheetSource for MemorySheets {
    fn load_sheet(&self, path: &Path, sheet: &SheetId) -> Result<RawGrid> {
        self.sheets
            .get(&(path.to_path_buf(), sheet.to_string()))
            .cloned()
            .ok_or_else(|| EtlError::SourceUnavailable {
                path: path.to_path_buf(),
                sheet: sheet.to_string(),
                reason: "sheet not registered".into(),
            })
    }

    fn exists(&self, path: &Path) -> bool {
        self.sheets.keys().any(|(p, _)| p == path)
    }
}
