use std::path::PathBuf;

use error_stack::ResultExt;

use super::{
    import_timeline::{EVENTS_SHEET, PERIODS_SHEET},
    routine::{Routine, RoutineError},
};
use crate::{
    compare::{self, CompareError, ComparisonReport},
    source::{ExcelWorkbook, TabularSource},
};

pub const COMPARED_SHEETS: [&str; 2] = [EVENTS_SHEET, PERIODS_SHEET];

/// Compares every named sheet independently; one failing sheet does not stop the others.
pub fn compare_sheets<A, B>(
    old: &A,
    new: &B,
    sheets: &[&str],
) -> Vec<(String, error_stack::Result<ComparisonReport, CompareError>)>
where
    A: TabularSource + ?Sized,
    B: TabularSource + ?Sized,
{
    sheets
        .iter()
        .map(|sheet| (sheet.to_string(), compare::compare_workbooks(old, new, sheet)))
        .collect()
}

/// Prints the rows added to `Events` and `Periods` between two workbook snapshots.
pub struct CompareWorkbooksRoutine {
    old_path: PathBuf,
    new_path: PathBuf,
}

impl CompareWorkbooksRoutine {
    pub fn new(old_path: impl Into<PathBuf>, new_path: impl Into<PathBuf>) -> Self {
        CompareWorkbooksRoutine {
            old_path: old_path.into(),
            new_path: new_path.into(),
        }
    }
}

#[async_trait::async_trait]
impl Routine for CompareWorkbooksRoutine {
    fn name(&self) -> &str {
        "CompareWorkbooksRoutine"
    }

    async fn run(&self) -> error_stack::Result<(), RoutineError> {
        let open = |path: &PathBuf| {
            ExcelWorkbook::open(path).change_context_lazy(|| {
                RoutineError::routine_failure(format!("Could not open {}", path.display()))
            })
        };
        let old = open(&self.old_path)?;
        let new = open(&self.new_path)?;

        let mut failed = Vec::new();
        for (sheet, outcome) in compare_sheets(&old, &new, &COMPARED_SHEETS) {
            match outcome {
                Ok(report) => println!("Comparing sheet: {}\n{}", sheet, report),
                Err(report) => {
                    tracing::error!("Failed to compare sheet {}: {:?}", sheet, report);
                    failed.push(sheet);
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(error_stack::report!(RoutineError::routine_failure(format!(
                "Could not compare sheets: {}",
                failed.join(", ")
            ))))
        }
    }
}
