use error_stack::ResultExt;
use tracing::instrument;

use super::routine::{Routine, RoutineError};
use crate::{
    compare::{self, DifferenceReport},
    sheets::SpreadsheetManager,
    source::{Sheet, TabularSource},
    transfer::SinkError,
};

/// A remote range readable as a table with a header row.
#[async_trait::async_trait]
pub trait RemoteTable: Send + Sync {
    async fn read_table(&self, range: &str) -> error_stack::Result<Sheet, SinkError>;
}

#[async_trait::async_trait]
impl RemoteTable for SpreadsheetManager {
    async fn read_table(&self, range: &str) -> error_stack::Result<Sheet, SinkError> {
        self.read_records(range)
            .await
            .change_context(SinkError::RemoteCall("values.get"))
    }
}

/// Prefixes `range` with the quoted sheet name unless it already names a sheet.
fn qualified_range(sheet_name: &str, range: &str) -> String {
    if range.contains('!') {
        range.to_owned()
    } else {
        format!("'{}'!{}", sheet_name.replace('\'', "''"), range)
    }
}

/// Diffs a local sheet against the same table kept in a remote spreadsheet.
pub struct CompareRemoteRoutine<T, R> {
    local: T,
    remote: R,
    sheet_name: String,
    range: String,
    columns: Vec<String>,
}

impl<T, R> CompareRemoteRoutine<T, R>
where
    T: TabularSource + Send + Sync,
    R: RemoteTable,
{
    /// With no `columns`, every column shared by both sides is compared.
    pub fn new(local: T, remote: R, sheet_name: &str, range: &str, columns: Vec<String>) -> Self {
        CompareRemoteRoutine {
            local,
            remote,
            sheet_name: sheet_name.to_owned(),
            range: range.to_owned(),
            columns,
        }
    }

    #[instrument(skip(self), fields(sheet = %self.sheet_name, range = %self.range))]
    pub async fn report(&self) -> error_stack::Result<DifferenceReport, RoutineError> {
        let local = self.local.sheet(&self.sheet_name).change_context_lazy(|| {
            RoutineError::routine_failure(format!("Could not read local sheet {}", self.sheet_name))
        })?;

        let range = qualified_range(&self.sheet_name, &self.range);
        let remote = self.remote.read_table(&range).await.change_context_lazy(|| {
            RoutineError::routine_failure(format!("Could not read remote range {}", range))
        })?;

        let columns = if self.columns.is_empty() {
            compare::common_columns(local, &remote)
        } else {
            self.columns.clone()
        };
        tracing::debug!("Comparing columns {:?}", columns);

        compare::differences(local, &remote, &columns)
            .change_context(RoutineError::routine_failure("Comparison failed"))
    }
}

#[async_trait::async_trait]
impl<T, R> Routine for CompareRemoteRoutine<T, R>
where
    T: TabularSource + Send + Sync,
    R: RemoteTable,
{
    fn name(&self) -> &str {
        "CompareRemoteRoutine"
    }

    async fn run(&self) -> error_stack::Result<(), RoutineError> {
        let report = self.report().await?;
        print!("{}", report);
        Ok(())
    }
}
