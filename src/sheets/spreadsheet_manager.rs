use std::{collections::HashMap, fmt::Debug};

use error_stack::{report, ResultExt};
use google_sheets4::{
    api::{BatchUpdateSpreadsheetRequest, Request, UpdateCellsRequest, ValueRange},
    hyper::client::HttpConnector,
    hyper_rustls::HttpsConnector,
    client::GetToken,
    FieldMask, Sheets,
};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

use super::{
    a1_notation::CellRange,
    auth,
    http_client::{self, HttpClient},
    value_range_factory::{cell_count, ValueRangeFactory},
};
use crate::{
    config::google_config::GoogleConfig,
    source::{CellValue, Sheet},
    transfer::{OutputRecord, RemoteSink, SinkError},
};

pub struct SpreadsheetManager {
    spreadsheet_id: String,
    hub: Sheets<HttpsConnector<HttpConnector>>,
    sheet_id_cache: RwLock<HashMap<String, i32>>,
}

impl Debug for SpreadsheetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SpreadsheetManager {{ spreadsheet_id: {:?} }}",
            self.spreadsheet_id
        )
    }
}

#[derive(Error, Debug)]
pub enum SpreadsheetManagerError {
    #[error("Failed to authenticate with Google Sheets")]
    FailedToAuthenticate,
    #[error("Failed to fetch sheet id of '{0}'")]
    FailedToFetchSheetId(String),
    #[error("Failed to fetch range {0}")]
    FailedToFetchRange(String),
    #[error("Failed to append to range {0}")]
    FailedToAppendRange(String),
    #[error("Failed to clear range {0}")]
    FailedToClearRange(String),
    #[error("Invalid range {0}")]
    InvalidRange(String),
}

impl SpreadsheetManager {
    #[instrument(name = "SpreadsheetManager::new", skip(config))]
    pub async fn new(
        spreadsheet_id: &str,
        config: &GoogleConfig,
    ) -> error_stack::Result<Self, SpreadsheetManagerError> {
        let client = http_client::http_client()
            .change_context(SpreadsheetManagerError::FailedToAuthenticate)
            .attach_printable("Could not load the native certificate roots")?;
        let auth = auth::service_account(config, client.clone())
            .await
            .change_context(SpreadsheetManagerError::FailedToAuthenticate)?;

        Ok(Self::with_authenticator(spreadsheet_id, client, auth))
    }

    pub fn with_authenticator<A: GetToken + 'static>(
        spreadsheet_id: &str,
        client: HttpClient,
        auth: A,
    ) -> Self {
        SpreadsheetManager {
            spreadsheet_id: spreadsheet_id.to_owned(),
            hub: Sheets::new(client, auth),
            sheet_id_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Sends every call to `base_url` instead of the public Sheets endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base_url = format!("{}/", base_url.trim_end_matches('/'));
        self.hub.root_url(base_url.clone());
        self.hub.base_url(base_url);
        self
    }

    #[instrument]
    pub async fn get_sheet_id(
        &self,
        sheet_title: &str,
    ) -> error_stack::Result<i32, SpreadsheetManagerError> {
        if let Some(sheet_id) = self.sheet_id_cache.read().await.get(sheet_title).copied() {
            return Ok(sheet_id);
        }

        let response = self
            .hub
            .spreadsheets()
            .get(&self.spreadsheet_id)
            .doit()
            .await
            .change_context_lazy(|| {
                SpreadsheetManagerError::FailedToFetchSheetId(sheet_title.to_owned())
            })?;

        let sheets = response.1.sheets.unwrap_or_default();

        let mut guard = self.sheet_id_cache.write().await;
        for sheet in &sheets {
            if let (Some(sheet_id), Some(title)) = (
                sheet.properties.as_ref().and_then(|p| p.sheet_id),
                sheet.properties.as_ref().and_then(|p| p.title.as_ref()),
            ) {
                guard.insert(title.clone(), sheet_id);
            }
        }

        guard.get(sheet_title).copied().ok_or_else(|| {
            report!(SpreadsheetManagerError::FailedToFetchSheetId(
                sheet_title.to_owned()
            ))
            .attach_printable(format!("Sheet '{}' not found", sheet_title))
        })
    }

    /// Appends rows after the table found at `range`, inserting new rows rather than
    /// overwriting. Values are stored as given, without formula or number parsing.
    #[instrument(skip(value_range), fields(cells = cell_count(&value_range)))]
    pub async fn append_range(
        &self,
        range: &str,
        value_range: ValueRange,
    ) -> error_stack::Result<usize, SpreadsheetManagerError> {
        let (_, response) = self
            .hub
            .spreadsheets()
            .values_append(value_range, &self.spreadsheet_id, range)
            .value_input_option("RAW")
            .insert_data_option("INSERT_ROWS")
            .doit()
            .await
            .change_context_lazy(|| SpreadsheetManagerError::FailedToAppendRange(range.to_owned()))?;

        let appended = response
            .updates
            .and_then(|updates| updates.updated_cells)
            .unwrap_or_default();
        tracing::info!("{} cells appended.", appended);

        Ok(appended.max(0) as usize)
    }

    /// Clears values and formatting of `range`, which must name its sheet.
    #[instrument]
    pub async fn clear_values_and_format(
        &self,
        range: &str,
    ) -> error_stack::Result<(), SpreadsheetManagerError> {
        let cell_range = range
            .parse::<CellRange>()
            .change_context_lazy(|| SpreadsheetManagerError::InvalidRange(range.to_owned()))?;
        let sheet_title = cell_range.sheet_title.as_deref().ok_or_else(|| {
            report!(SpreadsheetManagerError::InvalidRange(range.to_owned()))
                .attach_printable("The range must name its sheet, e.g. Sheet1!A4:L")
        })?;

        let sheet_id = self.get_sheet_id(sheet_title).await?;

        let request = BatchUpdateSpreadsheetRequest {
            requests: Some(vec![Request {
                update_cells: Some(UpdateCellsRequest {
                    range: Some(cell_range.to_grid_range(sheet_id)),
                    fields: Some(FieldMask::new(&["userEnteredValue", "userEnteredFormat"])),
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            ..Default::default()
        };

        self.hub
            .spreadsheets()
            .batch_update(request, &self.spreadsheet_id)
            .doit()
            .await
            .change_context_lazy(|| SpreadsheetManagerError::FailedToClearRange(range.to_owned()))?;

        tracing::info!("Data and formatting cleared from range: {}", range);
        Ok(())
    }

    #[instrument]
    pub async fn read_range(
        &self,
        range: &str,
    ) -> error_stack::Result<Vec<Vec<Value>>, SpreadsheetManagerError> {
        let (_, value_range) = self
            .hub
            .spreadsheets()
            .values_get(&self.spreadsheet_id, range)
            .doit()
            .await
            .change_context_lazy(|| SpreadsheetManagerError::FailedToFetchRange(range.to_owned()))?;

        Ok(value_range.values.unwrap_or_default())
    }

    /// Reads `range` as a table whose first row holds the column names.
    pub async fn read_records(
        &self,
        range: &str,
    ) -> error_stack::Result<Sheet, SpreadsheetManagerError> {
        let values = self.read_range(range).await?;
        if values.is_empty() {
            tracing::warn!("No data found in {}", range);
        }
        Ok(values_to_sheet(range, values))
    }
}

#[async_trait::async_trait]
impl RemoteSink for SpreadsheetManager {
    async fn append_rows(
        &self,
        range: &str,
        records: &[OutputRecord],
    ) -> error_stack::Result<(), SinkError> {
        self.append_range(range, ValueRange::from_records(records))
            .await
            .map(|_| ())
            .change_context(SinkError::RemoteCall("values.append"))
    }

    async fn clear_range(&self, range: &str) -> error_stack::Result<(), SinkError> {
        self.clear_values_and_format(range)
            .await
            .map_err(|report| {
                let context = match report.current_context() {
                    SpreadsheetManagerError::InvalidRange(range) => {
                        SinkError::InvalidRange(range.clone())
                    }
                    _ => SinkError::RemoteCall("spreadsheets.batchUpdate"),
                };
                report.change_context(context)
            })
    }

    async fn resolve_sheet_id(&self, sheet_title: &str) -> error_stack::Result<i32, SinkError> {
        self.get_sheet_id(sheet_title)
            .await
            .change_context_lazy(|| SinkError::SheetNotFound(sheet_title.to_owned()))
    }
}

fn json_to_cell(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => n.as_f64().map(CellValue::Float).unwrap_or_default(),
        },
        Value::String(s) if s.is_empty() => CellValue::Empty,
        Value::String(s) => CellValue::Text(s),
        other => CellValue::Text(other.to_string()),
    }
}

/// First row becomes the header; rows shorter than the header are padded with empty cells.
fn values_to_sheet(range: &str, values: Vec<Vec<Value>>) -> Sheet {
    let name = range
        .parse::<CellRange>()
        .ok()
        .and_then(|range| range.sheet_title)
        .unwrap_or_else(|| range.to_owned());

    let mut rows = values.into_iter();
    let header = rows
        .next()
        .map(|header| {
            header
                .into_iter()
                .map(|cell| json_to_cell(cell).to_clean_string())
                .collect()
        })
        .unwrap_or_default();

    Sheet::from_rows(
        name,
        header,
        rows.map(|row| row.into_iter().map(json_to_cell).collect()),
    )
}
