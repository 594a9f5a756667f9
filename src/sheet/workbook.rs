use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::debug;

use super::grid::{Cell, RawGrid};
use super::SheetSource;
use crate::config::SheetId;
use crate::error::{EtlError, Result};

/// Reads sheets out of xlsx/xls/xlsb/ods workbooks on local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkbookLoader;

impl SheetSource for WorkbookLoader {
    #[tracing::instrument(level = "debug", skip(self, path), fields(path = %path.display()))]
    fn load_sheet(&self, path: &Path, sheet: &SheetId) -> Result<RawGrid> {
        let unavailable = |reason: String| EtlError::SourceUnavailable {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            reason,
        };

        if !path.is_file() {
            return Err(unavailable("file not found".into()));
        }
        let mut workbook = open_workbook_auto(path).map_err(|e| unavailable(e.to_string()))?;

        let range = match sheet {
            SheetId::Name(name) => workbook
                .worksheet_range(name)
                .map_err(|e| unavailable(e.to_string()))?,
            SheetId::Index(idx) => workbook
                .worksheet_range_at(*idx)
                .ok_or_else(|| {
                    unavailable(format!(
                        "workbook has {} sheets",
                        workbook.sheet_names().len()
                    ))
                })?
                .map_err(|e| unavailable(e.to_string()))?,
        };

        let grid = range_to_grid(&range);
        debug!(rows = grid.height(), cols = grid.width(), "loaded sheet");
        Ok(grid)
    }
}

/// Calamine ranges begin at the first used cell; pad back to absolute
/// positions so configured row offsets mean what they say.
fn range_to_grid(range: &Range<Data>) -> RawGrid {
    let (row0, col0) = match range.start() {
        Some((r, c)) => (r as usize, c as usize),
        None => return RawGrid::default(),
    };

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row0];
    for src in range.rows() {
        let mut row = vec![Cell::Empty; col0];
        row.extend(src.iter().map(data_to_cell));
        rows.push(row);
    }
    RawGrid::new(rows)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}
