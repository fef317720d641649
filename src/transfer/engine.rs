use std::time::Duration;

use error_stack::ResultExt;
use thiserror::Error;
use tracing::instrument;

use super::{
    record::{shape_records, FieldMapping, OutputRecord},
    sink::RemoteSink,
};
use crate::{config::transfer_config::TransferConfig, source::Row};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Failed to dispatch batch {batch} ({rows} rows) to {range}")]
    BatchDispatch {
        batch: usize,
        rows: usize,
        range: String,
    },
    #[error("Failed to clear range {0}")]
    Clear(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferSummary {
    pub rows: usize,
    pub batches: usize,
}

/// Sends shaped records to a [`RemoteSink`] in fixed-size batches, pausing between full batches
/// to stay under the sink's call-rate limit.
pub struct TransferEngine<'a, S: RemoteSink + ?Sized> {
    sink: &'a S,
    anchor: String,
    batch_size: usize,
    batch_delay: Duration,
}

impl<'a, S: RemoteSink + ?Sized> TransferEngine<'a, S> {
    pub fn new(sink: &'a S, config: &TransferConfig) -> Self {
        TransferEngine {
            sink,
            anchor: config.anchor.clone(),
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay(),
        }
    }

    /// Clears values and formatting of `range`. Never called implicitly by [`Self::transfer`].
    #[instrument(skip(self))]
    pub async fn clear(&self, range: &str) -> error_stack::Result<(), TransferError> {
        self.sink
            .clear_range(range)
            .await
            .change_context_lazy(|| TransferError::Clear(range.to_owned()))
    }

    /// Appends one record per row at the anchor. Stops at the first sink failure; batches already
    /// dispatched stay on the remote side.
    #[instrument(skip(self, rows), fields(rows = rows.len(), anchor = %self.anchor))]
    pub async fn transfer(
        &self,
        rows: &[Row],
        mapping: &FieldMapping,
    ) -> error_stack::Result<TransferSummary, TransferError> {
        let mut summary = TransferSummary::default();
        let mut batch: Vec<OutputRecord> = Vec::with_capacity(self.batch_size);

        for record in shape_records(rows, mapping) {
            batch.push(record);
            summary.rows += 1;

            if batch.len() >= self.batch_size {
                self.dispatch(&batch, &mut summary).await?;
                tokio::time::sleep(self.batch_delay).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.dispatch(&batch, &mut summary).await?;
        }

        tracing::info!(
            "Transferred {} rows in {} batches to {}",
            summary.rows,
            summary.batches,
            self.anchor
        );
        Ok(summary)
    }

    async fn dispatch(
        &self,
        batch: &[OutputRecord],
        summary: &mut TransferSummary,
    ) -> error_stack::Result<(), TransferError> {
        self.sink
            .append_rows(&self.anchor, batch)
            .await
            .change_context_lazy(|| TransferError::BatchDispatch {
                batch: summary.batches,
                rows: batch.len(),
                range: self.anchor.clone(),
            })?;

        summary.batches += 1;
        tracing::debug!("Batch {} dispatched ({} rows)", summary.batches, batch.len());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use error_stack::report;
    use tokio::time::Instant;

    use super::*;
    use crate::{
        source::{tests::sheet, Sheet},
        transfer::{record::shape_record, sink::SinkError},
    };

    /// Records every call it receives, optionally failing the n-th append.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub appends: Mutex<Vec<(String, Vec<OutputRecord>, Instant)>>,
        pub clears: Mutex<Vec<String>>,
        pub fail_on_append: Option<usize>,
    }

    #[async_trait::async_trait]
    impl RemoteSink for RecordingSink {
        async fn append_rows(
            &self,
            range: &str,
            records: &[OutputRecord],
        ) -> error_stack::Result<(), SinkError> {
            let mut appends = self.appends.lock().unwrap();
            if self.fail_on_append == Some(appends.len()) {
                return Err(report!(SinkError::RemoteCall("append rejected")));
            }
            appends.push((range.to_owned(), records.to_vec(), Instant::now()));
            Ok(())
        }

        async fn clear_range(&self, range: &str) -> error_stack::Result<(), SinkError> {
            self.clears.lock().unwrap().push(range.to_owned());
            Ok(())
        }

        async fn resolve_sheet_id(&self, sheet_title: &str) -> error_stack::Result<i32, SinkError> {
            match sheet_title {
                "Sheet1" => Ok(0),
                other => Err(report!(SinkError::SheetNotFound(other.to_owned()))),
            }
        }
    }

    fn numbered_sheet(rows: usize) -> Sheet {
        let values: Vec<Vec<String>> = (0..rows)
            .map(|i| vec![format!("{}", 1900 + i), format!("Event {}", i), String::new()])
            .collect();
        let refs: Vec<Vec<&str>> = values
            .iter()
            .map(|row| row.iter().map(String::as_str).collect())
            .collect();
        let slices: Vec<&[&str]> = refs.iter().map(Vec::as_slice).collect();
        sheet("Events", &["Time", "Name", "Description"], &slices)
    }

    fn config() -> TransferConfig {
        TransferConfig::default()
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_count_and_sizes() {
        for (rows, expected_batches) in [(0, 0), (1, 1), (49, 1), (50, 1), (51, 2), (120, 3)] {
            let sink = RecordingSink::default();
            let engine = TransferEngine::new(&sink, &config());
            let sheet = numbered_sheet(rows);

            let summary = engine
                .transfer(sheet.rows(), &FieldMapping::events())
                .await
                .unwrap();

            let appends = sink.appends.lock().unwrap();
            assert_eq!(summary, TransferSummary { rows, batches: expected_batches });
            assert_eq!(appends.len(), expected_batches, "{} rows", rows);
            for (index, (range, batch, _)) in appends.iter().enumerate() {
                assert_eq!(range, "Sheet1!A4");
                if index + 1 < appends.len() {
                    assert_eq!(batch.len(), 50);
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_concatenate_to_rows_in_order() {
        let sink = RecordingSink::default();
        let engine = TransferEngine::new(&sink, &config());
        let sheet = numbered_sheet(123);
        let mapping = FieldMapping::events();

        engine.transfer(sheet.rows(), &mapping).await.unwrap();

        let dispatched: Vec<OutputRecord> = sink
            .appends
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, batch, _)| batch.clone())
            .collect();
        let expected: Vec<OutputRecord> = sheet
            .rows()
            .iter()
            .enumerate()
            .map(|(index, row)| shape_record(row, index, &mapping))
            .collect();
        assert_eq!(dispatched, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_follows_full_batches_only() {
        let sink = RecordingSink::default();
        let engine = TransferEngine::new(&sink, &config());
        let sheet = numbered_sheet(120);
        let start = Instant::now();

        engine
            .transfer(sheet.rows(), &FieldMapping::events())
            .await
            .unwrap();

        let appends = sink.appends.lock().unwrap();
        let offsets: Vec<Duration> = appends.iter().map(|(_, _, at)| *at - start).collect();
        assert_eq!(
            offsets,
            vec![Duration::ZERO, Duration::from_secs(1), Duration::from_secs(2)]
        );
        // The trailing partial batch is not followed by a pause
        assert_eq!(Instant::now() - start, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exact_multiple_waits_after_last_full_batch() {
        let sink = RecordingSink::default();
        let engine = TransferEngine::new(&sink, &config());
        let sheet = numbered_sheet(100);
        let start = Instant::now();

        let summary = engine
            .transfer(sheet.rows(), &FieldMapping::events())
            .await
            .unwrap();

        assert_eq!(summary.batches, 2);
        assert_eq!(Instant::now() - start, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_failure_aborts_transfer() {
        let sink = RecordingSink {
            fail_on_append: Some(1),
            ..Default::default()
        };
        let engine = TransferEngine::new(&sink, &config());
        let sheet = numbered_sheet(160);

        let report = engine
            .transfer(sheet.rows(), &FieldMapping::events())
            .await
            .unwrap_err();

        assert_eq!(
            report.current_context(),
            &TransferError::BatchDispatch {
                batch: 1,
                rows: 50,
                range: "Sheet1!A4".to_owned()
            }
        );
        // Only the first batch made it; nothing after the failure
        assert_eq!(sink.appends.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transfer_never_clears() {
        let sink = RecordingSink::default();
        let engine = TransferEngine::new(&sink, &config());
        let sheet = numbered_sheet(3);

        engine
            .transfer(sheet.rows(), &FieldMapping::events())
            .await
            .unwrap();
        assert!(sink.clears.lock().unwrap().is_empty());

        engine.clear("Sheet1!A4:L").await.unwrap();
        assert_eq!(*sink.clears.lock().unwrap(), vec!["Sheet1!A4:L".to_owned()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_batch_size() {
        let sink = RecordingSink::default();
        let config = TransferConfig {
            batch_size: 2,
            batch_delay_ms: 10,
            ..TransferConfig::default()
        };
        let engine = TransferEngine::new(&sink, &config);
        let sheet = numbered_sheet(5);

        let summary = engine
            .transfer(sheet.rows(), &FieldMapping::events())
            .await
            .unwrap();

        assert_eq!(summary, TransferSummary { rows: 5, batches: 3 });
        let sizes: Vec<usize> = sink
            .appends
            .lock()
            .unwrap()
            .iter()
            .map(|(_, batch, _)| batch.len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }
}
