use error_stack::ResultExt;
use tracing::instrument;

use super::routine::{Routine, RoutineError};
use crate::{
    config::transfer_config::TransferConfig,
    source::TabularSource,
    transfer::{FieldMapping, RemoteSink, TransferEngine},
};

pub const EVENTS_SHEET: &str = "Events";
pub const PERIODS_SHEET: &str = "Periods";

/// Replaces the timeline rows of the remote sheet with the `Events` and `Periods` of a workbook.
pub struct ImportTimelineRoutine<T, S> {
    source: T,
    sink: S,
    config: TransferConfig,
}

impl<T, S> ImportTimelineRoutine<T, S>
where
    T: TabularSource + Send + Sync,
    S: RemoteSink,
{
    pub fn new(source: T, sink: S, config: TransferConfig) -> Self {
        ImportTimelineRoutine {
            source,
            sink,
            config,
        }
    }

    fn sheets() -> [(&'static str, FieldMapping); 2] {
        [
            (EVENTS_SHEET, FieldMapping::events()),
            (PERIODS_SHEET, FieldMapping::periods()),
        ]
    }
}

#[async_trait::async_trait]
impl<T, S> Routine for ImportTimelineRoutine<T, S>
where
    T: TabularSource + Send + Sync,
    S: RemoteSink,
{
    fn name(&self) -> &str {
        "ImportTimelineRoutine"
    }

    #[instrument(skip_all, fields(clear_range = %self.config.clear_range))]
    async fn run(&self) -> error_stack::Result<(), RoutineError> {
        let engine = TransferEngine::new(&self.sink, &self.config);

        engine
            .clear(&self.config.clear_range)
            .await
            .change_context_lazy(|| {
                RoutineError::routine_failure(format!(
                    "Could not clear {}",
                    self.config.clear_range
                ))
            })?;
        tracing::info!("Cleared {}", self.config.clear_range);

        for (sheet, mapping) in Self::sheets() {
            let rows = self.source.sheet_rows(sheet).change_context_lazy(|| {
                RoutineError::routine_failure(format!("Could not read sheet {}", sheet))
            })?;

            tracing::info!("Transferring {} rows from {}", rows.len(), sheet);
            engine
                .transfer(rows, &mapping)
                .await
                .change_context_lazy(|| {
                    RoutineError::routine_failure(format!("Transfer of sheet {} failed", sheet))
                })?;
        }

        Ok(())
    }
}
