pub mod cell;
pub mod excel;

use std::{collections::HashMap, sync::Arc};

use error_stack::report;
use thiserror::Error;

pub use cell::CellValue;
pub use excel::ExcelWorkbook;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Sheet '{0}' does not exist in the document")]
    SheetNotFound(String),
    #[error("Failed to open workbook '{0}'")]
    WorkbookOpen(String),
    #[error("Failed to read sheet '{0}'")]
    SheetRead(String),
}

/// One data row of a sheet. Cells keep the column order of the header row.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<CellValue>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, mut values: Vec<CellValue>) -> Self {
        values.resize(columns.len(), CellValue::Empty);
        Row { columns, values }
    }

    /// Value of the named column, `None` when the sheet has no such column.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .position(|name| name == column)
            .map(|index| &self.values[index])
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    /// Keeps only `columns`, in that order; absent columns become empty cells.
    pub fn project(&self, columns: &[String]) -> Row {
        let values = columns
            .iter()
            .map(|column| self.get(column).cloned().unwrap_or_default())
            .collect();
        Row::new(columns.into(), values)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// Rows compare cell by cell over the same column names.
impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.values == other.values
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    columns: Arc<[String]>,
    rows: Vec<Row>,
}

impl Sheet {
    /// Builds a sheet from its header row and raw data rows.
    ///
    /// Blank header cells become `Unnamed: <index>` and repeated names get a
    /// `.1`, `.2`... suffix so every column stays addressable by name.
    pub fn from_rows<S, I>(name: S, header: Vec<String>, rows: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = Vec<CellValue>>,
    {
        let columns: Arc<[String]> = dedup_headers(header).into();
        let rows = rows
            .into_iter()
            .filter(|values| !values.iter().all(CellValue::is_missing))
            .map(|values| Row::new(Arc::clone(&columns), values))
            .collect();

        Sheet {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rectangular slice over the data rows, zero-based and half-open on both axes.
    ///
    /// Bounds past the sheet extent are clamped; a selection completely outside
    /// the sheet is empty.
    pub fn slice(&self, start_row: usize, end_row: usize, start_col: usize, end_col: usize) -> Vec<Row> {
        let end_row = end_row.min(self.rows.len());
        let end_col = end_col.min(self.columns.len());
        if start_row >= end_row || start_col >= end_col {
            return Vec::new();
        }

        let columns: Arc<[String]> = self.columns[start_col..end_col].into();
        self.rows[start_row..end_row]
            .iter()
            .map(|row| Row::new(Arc::clone(&columns), row.values[start_col..end_col].to_vec()))
            .collect()
    }
}

fn dedup_headers(header: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let name = if name.trim().is_empty() {
                format!("Unnamed: {}", index)
            } else {
                name
            };
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = match *count {
                0 => name,
                n => format!("{}.{}", name, n),
            };
            *count += 1;
            unique
        })
        .collect()
}

/// A document made of named sheets of rows.
pub trait TabularSource {
    fn sheet_names(&self) -> Vec<String>;

    fn sheet(&self, name: &str) -> error_stack::Result<&Sheet, SourceError>;

    /// Ordered rows of the named sheet, with every column.
    fn sheet_rows(&self, name: &str) -> error_stack::Result<&[Row], SourceError> {
        Ok(self.sheet(name)?.rows())
    }

    /// Sub-range of the named sheet. See [`Sheet::slice`] for the bounds rules.
    fn range(
        &self,
        name: &str,
        start_row: usize,
        end_row: usize,
        start_col: usize,
        end_col: usize,
    ) -> error_stack::Result<Vec<Row>, SourceError> {
        Ok(self.sheet(name)?.slice(start_row, end_row, start_col, end_col))
    }
}

/// Every sheet of a document, loaded up front.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Workbook { sheets }
    }
}

impl TabularSource for Workbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.name.clone()).collect()
    }

    fn sheet(&self, name: &str) -> error_stack::Result<&Sheet, SourceError> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name == name)
            .ok_or_else(|| report!(SourceError::SheetNotFound(name.to_owned())))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn text_row(values: &[&str]) -> Vec<CellValue> {
        values
            .iter()
            .map(|value| match *value {
                "" => CellValue::Empty,
                value => CellValue::Text(value.to_owned()),
            })
            .collect()
    }

    pub(crate) fn sheet(name: &str, header: &[&str], rows: &[&[&str]]) -> Sheet {
        Sheet::from_rows(
            name,
            header.iter().map(|h| h.to_string()).collect(),
            rows.iter().map(|row| text_row(row)),
        )
    }

    fn events_workbook() -> Workbook {
        Workbook::new(vec![
            sheet(
                "Events",
                &["Time", "Name", "Description"],
                &[
                    &["10:00", "A", ""],
                    &["11:00", "B", "d2"],
                    &["12:00", "C", "d3"],
                ],
            ),
            sheet("Periods", &["Time from", "Time to", "Name"], &[]),
        ])
    }

    #[test]
    fn test_sheet_names_keep_document_order() {
        assert_eq!(events_workbook().sheet_names(), vec!["Events", "Periods"]);
    }

    #[test]
    fn test_sheet_rows_preserve_order_and_columns() {
        let workbook = events_workbook();
        let rows = workbook.sheet_rows("Events").unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].columns(), &["Time", "Name", "Description"]);
        assert_eq!(rows[1].get("Name"), Some(&CellValue::Text("B".into())));
        assert_eq!(rows[2].get("Time"), Some(&CellValue::Text("12:00".into())));
        assert_eq!(rows[0].get("Missing column"), None);
    }

    #[test]
    fn test_missing_sheet_is_an_error() {
        let workbook = events_workbook();
        let report = workbook.sheet_rows("InvalidSheet").unwrap_err();
        assert_eq!(
            report.current_context(),
            &SourceError::SheetNotFound("InvalidSheet".into())
        );

        let report = workbook.range("InvalidSheet", 0, 1, 0, 1).unwrap_err();
        assert_eq!(
            report.current_context(),
            &SourceError::SheetNotFound("InvalidSheet".into())
        );
    }

    #[test]
    fn test_range_selects_rectangle() {
        let workbook = events_workbook();
        let rows = workbook.range("Events", 1, 3, 1, 3).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].columns(), &["Name", "Description"]);
        assert_eq!(rows[0].get("Name"), Some(&CellValue::Text("B".into())));
        assert_eq!(rows[1].get("Description"), Some(&CellValue::Text("d3".into())));
        assert_eq!(rows[0].get("Time"), None);
    }

    #[test]
    fn test_range_clamps_to_sheet_extent() {
        let workbook = events_workbook();
        let rows = workbook.range("Events", 0, 5, 0, 3).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].values().len(), 3);
    }

    #[test]
    fn test_range_outside_sheet_is_empty() {
        let workbook = events_workbook();
        assert!(workbook.range("Events", 10, 20, 0, 3).unwrap().is_empty());
        assert!(workbook.range("Events", 0, 3, 7, 9).unwrap().is_empty());
        assert!(workbook.range("Periods", 0, 3, 0, 3).unwrap().is_empty());
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let sheet = sheet("S", &["A", "B"], &[&["1", "2"], &["", ""], &["3", ""]]);
        assert_eq!(sheet.len(), 2);
    }

    #[test]
    fn test_headers_are_made_unique() {
        let sheet = sheet("S", &["Name", "", "Name", "Name"], &[]);
        assert_eq!(sheet.columns(), &["Name", "Unnamed: 1", "Name.1", "Name.2"]);
    }

    #[test]
    fn test_short_rows_are_padded_with_empty_cells() {
        let columns: Arc<[String]> = vec!["A".to_owned(), "B".to_owned()].into();
        let row = Row::new(columns, vec![CellValue::Int(1)]);
        assert_eq!(row.get("B"), Some(&CellValue::Empty));
    }
}
