//! Spreadsheet documents on disk (`.xlsx`, `.xls`, `.xlsb`, `.ods`) read with calamine.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use error_stack::{report, ResultExt};
use tracing::instrument;

use super::{CellValue, Sheet, SourceError, Workbook};

pub struct ExcelWorkbook;

impl ExcelWorkbook {
    /// Loads every sheet of the document. The first row of each sheet is its header.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> error_stack::Result<Workbook, SourceError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let mut workbook = open_workbook_auto(path)
            .map_err(|e| report!(SourceError::WorkbookOpen(path_str.clone())).attach_printable(e.to_string()))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| report!(SourceError::SheetRead(name.clone())).attach_printable(e.to_string()))
                .attach_printable_lazy(|| format!("Workbook: {}", path_str))?;

            let mut rows = range.rows();
            let header = rows
                .next()
                .map(|cells| cells.iter().map(|cell| cell_to_value(cell).to_clean_string()).collect())
                .unwrap_or_default();
            let data = rows.map(|cells| cells.iter().map(cell_to_value).collect::<Vec<_>>());

            let sheet = Sheet::from_rows(name.clone(), header, data);
            tracing::debug!("Loaded sheet '{}' with {} rows", name, sheet.len());
            sheets.push(sheet);
        }

        Ok(Workbook::new(sheets))
    }
}

/// Convert a calamine cell into a [`CellValue`]
fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        Data::DateTime(dt) => match dt.as_datetime() {
            // Serial values below one day carry no date part
            Some(datetime) if dt.as_f64() < 1.0 => CellValue::Time(datetime.time()),
            Some(datetime) => CellValue::DateTime(datetime),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
