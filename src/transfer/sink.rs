use thiserror::Error;

use super::record::OutputRecord;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Remote call failed: {0}")]
    RemoteCall(&'static str),
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),
    #[error("Invalid range '{0}'")]
    InvalidRange(String),
}

/// A remote tabular destination addressed by `SheetTitle!A1` ranges.
#[async_trait::async_trait]
pub trait RemoteSink: Send + Sync {
    /// Inserts `records` as new rows at `range`, pushing down whatever is already there.
    async fn append_rows(
        &self,
        range: &str,
        records: &[OutputRecord],
    ) -> error_stack::Result<(), SinkError>;

    /// Clears both values and cell formatting of `range`.
    async fn clear_range(&self, range: &str) -> error_stack::Result<(), SinkError>;

    async fn resolve_sheet_id(&self, sheet_title: &str) -> error_stack::Result<i32, SinkError>;
}
