//! Row-level comparison of two snapshots of the same sheet.

pub mod table;

use std::{
    collections::HashSet,
    fmt::{self, Formatter},
};

use error_stack::{report, ResultExt};
use thiserror::Error;

use crate::source::{CellValue, Row, Sheet, TabularSource};
use table::Table;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    #[error("Sheets '{0}' and '{1}' have no column in common")]
    NoCommonColumns(String, String),
    #[error("Column '{0}' is missing from sheet '{1}'")]
    MissingColumn(String, String),
    #[error("Failed to load sheet '{0}'")]
    Load(String),
}

/// Columns present in both sheets, in the order of `a`.
pub fn common_columns(a: &Sheet, b: &Sheet) -> Vec<String> {
    a.columns()
        .iter()
        .filter(|column| b.columns().contains(*column))
        .cloned()
        .collect()
}

fn row_key<'a>(row: &'a Row, columns: &[String]) -> Vec<&'a CellValue> {
    static EMPTY: CellValue = CellValue::Empty;
    columns
        .iter()
        .map(|column| row.get(column).unwrap_or(&EMPTY))
        .collect()
}

/// Rows of `b`, with their position in `b`, whose values on the columns shared with `a`
/// match no row of `a`. Row order does not matter and every duplicate in `b` is reported.
pub fn added_rows<'b>(
    a: &Sheet,
    b: &'b Sheet,
) -> error_stack::Result<Vec<(usize, &'b Row)>, CompareError> {
    let columns = common_columns(a, b);
    if columns.is_empty() {
        return Err(report!(CompareError::NoCommonColumns(
            a.name.clone(),
            b.name.clone()
        )));
    }

    let known: HashSet<Vec<&CellValue>> = a.rows().iter().map(|row| row_key(row, &columns)).collect();

    Ok(b.rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| !known.contains(&row_key(row, &columns)))
        .collect())
}

/// Rows of one sheet that were added in a newer snapshot of it.
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub sheet: String,
    pub columns: Vec<String>,
    pub added: Vec<(usize, Row)>,
}

impl ComparisonReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.added.is_empty() {
            return writeln!(f, "No rows have been added.");
        }

        let rows: Vec<(usize, &Row)> = self.added.iter().map(|(i, row)| (*i, row)).collect();
        writeln!(f, "Added rows:")?;
        write!(f, "{}", Table::new(&self.columns, &rows))
    }
}

/// Compares the sheet named `sheet` of two documents.
pub fn compare_workbooks<A, B>(
    old: &A,
    new: &B,
    sheet: &str,
) -> error_stack::Result<ComparisonReport, CompareError>
where
    A: TabularSource + ?Sized,
    B: TabularSource + ?Sized,
{
    let old_sheet = old
        .sheet(sheet)
        .change_context_lazy(|| CompareError::Load(sheet.to_owned()))
        .attach_printable("in the first document")?;
    let new_sheet = new
        .sheet(sheet)
        .change_context_lazy(|| CompareError::Load(sheet.to_owned()))
        .attach_printable("in the second document")?;

    let added = added_rows(old_sheet, new_sheet)?
        .into_iter()
        .map(|(i, row)| (i, row.clone()))
        .collect();

    Ok(ComparisonReport {
        sheet: sheet.to_owned(),
        columns: new_sheet.columns().to_vec(),
        added,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => write!(f, "local_only"),
            Side::Remote => write!(f, "remote_only"),
        }
    }
}

/// Rows present on only one side of a local/remote pair.
#[derive(Debug, Clone)]
pub struct DifferenceReport {
    pub columns: Vec<String>,
    pub local_only: Vec<Row>,
    pub remote_only: Vec<Row>,
}

impl DifferenceReport {
    pub fn is_empty(&self) -> bool {
        self.local_only.is_empty() && self.remote_only.is_empty()
    }
}

impl fmt::Display for DifferenceReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "No differences found.");
        }

        writeln!(f, "Differences found:")?;
        for (side, rows) in [(Side::Local, &self.local_only), (Side::Remote, &self.remote_only)] {
            if rows.is_empty() {
                continue;
            }
            let indexed: Vec<(usize, &Row)> = rows.iter().enumerate().collect();
            writeln!(f, "{}:", side)?;
            write!(f, "{}", Table::new(&self.columns, &indexed))?;
        }
        Ok(())
    }
}

fn clean_key(row: &Row, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|column| {
            row.get(column)
                .map(CellValue::to_clean_string)
                .unwrap_or_default()
        })
        .collect()
}

/// Compares a local sheet with its remote copy on the chosen columns. Values are compared by
/// their cleaned text, since the remote side only returns formatted strings.
pub fn differences(
    local: &Sheet,
    remote: &Sheet,
    columns: &[String],
) -> error_stack::Result<DifferenceReport, CompareError> {
    for (sheet, other) in [(local, remote), (remote, local)] {
        if let Some(missing) = columns.iter().find(|c| !sheet.columns().contains(*c)) {
            return Err(report!(CompareError::MissingColumn(
                missing.clone(),
                sheet.name.clone()
            ))
            .attach_printable(format!("Compared against '{}'", other.name)));
        }
    }
    if columns.is_empty() {
        return Err(report!(CompareError::NoCommonColumns(
            local.name.clone(),
            remote.name.clone()
        )));
    }

    let project = |rows: &[Row]| -> Vec<Row> {
        rows.iter()
            .map(|row| row.project(columns))
            .collect()
    };
    let local_rows = project(local.rows());
    let remote_rows = project(remote.rows());

    let local_keys: HashSet<Vec<String>> = local_rows.iter().map(|row| clean_key(row, columns)).collect();
    let remote_keys: HashSet<Vec<String>> = remote_rows.iter().map(|row| clean_key(row, columns)).collect();

    Ok(DifferenceReport {
        columns: columns.to_vec(),
        local_only: local_rows
            .iter()
            .filter(|row| !remote_keys.contains(&clean_key(row, columns)))
            .cloned()
            .collect(),
        remote_only: remote_rows
            .into_iter()
            .filter(|row| !local_keys.contains(&clean_key(row, columns)))
            .collect(),
    })
}
