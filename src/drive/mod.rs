//! Google Drive v3 file utilities over plain REST.

use std::{path::Path, time::Duration};

use error_stack::{report, ResultExt};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{event, instrument, Level};

use crate::sheets::auth::{GoogleAuthenticator, DRIVE_SCOPE};

pub const DRIVE_API_URL: &str = "https://www.googleapis.com";
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
pub const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";
pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS_MIME_TYPE: &str = "application/vnd.ms-excel";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const LIST_PAGE_SIZE: u32 = 100;
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType)";

#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Failed to obtain an access token")]
    Token,
    #[error("HTTP request failed: {0}")]
    HttpError(&'static str),
    #[error("HTTP status error: {0}")]
    HttpStatusError(String),
    #[error("JSON parsing failed")]
    JsonError,
    #[error("Failed to write '{0}'")]
    Io(String),
}

/// Supplies bearer tokens for Drive calls.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> error_stack::Result<String, DriveError>;
}

#[async_trait::async_trait]
impl TokenSource for GoogleAuthenticator {
    async fn access_token(&self) -> error_stack::Result<String, DriveError> {
        let token = self
            .token(&[DRIVE_SCOPE])
            .await
            .change_context(DriveError::Token)?;

        token
            .token()
            .map(str::to_owned)
            .ok_or_else(|| report!(DriveError::Token).attach_printable("Token response had no access token"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

impl std::fmt::Display for DriveFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (ID: {}, Type: {})", self.name, self.id, self.mime_type)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewFile<'a> {
    name: &'a str,
    mime_type: &'a str,
}

/// Escapes a value for use inside a single-quoted Drive query literal.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

pub struct DriveClient<T: TokenSource> {
    client: Client,
    base_url: String,
    tokens: T,
}

impl<T: TokenSource> std::fmt::Debug for DriveClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DriveClient {{ base_url: {:?} }}", self.base_url)
    }
}

impl<T: TokenSource> DriveClient<T> {
    pub fn new(tokens: T) -> error_stack::Result<Self, DriveError> {
        Self::with_base_url(tokens, DRIVE_API_URL)
    }

    pub fn with_base_url(tokens: T, base_url: &str) -> error_stack::Result<Self, DriveError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .change_context(DriveError::HttpError("client construction"))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            tokens,
        })
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.base_url)
    }

    async fn check_status(
        response: Response,
        operation: &'static str,
    ) -> error_stack::Result<Response, DriveError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(report!(DriveError::HttpStatusError(format!(
            "HTTP error {}: {}",
            status, error_text
        )))
        .attach_printable(format!("During {}", operation)))
    }

    /// Every file matching `query`, following pagination.
    #[instrument(skip(self))]
    async fn list(&self, query: Option<&str>) -> error_stack::Result<Vec<DriveFile>, DriveError> {
        let token = self.tokens.access_token().await?;
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params: Vec<(&str, String)> = vec![
                ("fields", LIST_FIELDS.to_owned()),
                ("pageSize", LIST_PAGE_SIZE.to_string()),
            ];
            if let Some(query) = query {
                params.push(("q", query.to_owned()));
            }
            if let Some(page_token) = &page_token {
                params.push(("pageToken", page_token.clone()));
            }

            let response = self
                .client
                .get(self.files_url())
                .bearer_auth(&token)
                .query(&params)
                .send()
                .await
                .change_context(DriveError::HttpError("files.list"))?;
            let page: FileList = Self::check_status(response, "files.list")
                .await?
                .json()
                .await
                .change_context(DriveError::JsonError)?;

            files.extend(page.files);
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        event!(Level::DEBUG, count = files.len(), "Listed files");
        Ok(files)
    }

    /// Files and folders directly under "My Drive".
    pub async fn list_root_files(&self) -> error_stack::Result<Vec<DriveFile>, DriveError> {
        self.list(Some("'root' in parents and trashed = false")).await
    }

    /// Id of the first folder named `folder_name`, or `None` when there is none.
    pub async fn get_folder_id(
        &self,
        folder_name: &str,
    ) -> error_stack::Result<Option<String>, DriveError> {
        let query = format!(
            "name = {} and mimeType = '{}'",
            quote(folder_name),
            FOLDER_MIME_TYPE
        );
        let folder = self.list(Some(&query)).await?.into_iter().next();
        if folder.is_none() {
            tracing::warn!("No folder named \"{}\" found.", folder_name);
        }
        Ok(folder.map(|folder| folder.id))
    }

    /// Files inside the folder named `folder_name`; empty when the folder does not exist.
    pub async fn list_files_in_folder(
        &self,
        folder_name: &str,
    ) -> error_stack::Result<Vec<DriveFile>, DriveError> {
        let Some(folder_id) = self.get_folder_id(folder_name).await? else {
            return Ok(Vec::new());
        };
        self.list(Some(&format!("{} in parents", quote(&folder_id))))
            .await
    }

    pub async fn list_excel_files(&self) -> error_stack::Result<Vec<DriveFile>, DriveError> {
        let query = format!("mimeType = '{}' or mimeType = '{}'", XLSX_MIME_TYPE, XLS_MIME_TYPE);
        self.list(Some(&query)).await
    }

    /// Creates an empty Google spreadsheet named `name`.
    #[instrument(skip(self))]
    pub async fn create_spreadsheet(&self, name: &str) -> error_stack::Result<DriveFile, DriveError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(self.files_url())
            .bearer_auth(&token)
            .query(&[("fields", "id, name, mimeType")])
            .json(&NewFile {
                name,
                mime_type: SPREADSHEET_MIME_TYPE,
            })
            .send()
            .await
            .change_context(DriveError::HttpError("files.create"))?;

        let file: DriveFile = Self::check_status(response, "files.create")
            .await?
            .json()
            .await
            .change_context(DriveError::JsonError)?;

        event!(Level::INFO, id = %file.id, "Created spreadsheet {}", file.name);
        Ok(file)
    }

    #[instrument(skip(self))]
    pub async fn delete_file(&self, file_id: &str) -> error_stack::Result<(), DriveError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .delete(format!("{}/{}", self.files_url(), file_id))
            .bearer_auth(&token)
            .send()
            .await
            .change_context(DriveError::HttpError("files.delete"))?;
        Self::check_status(response, "files.delete").await?;

        event!(Level::INFO, "Deleted file {}", file_id);
        Ok(())
    }

    /// Streams the content of `file_id` into `destination`, logging progress per chunk.
    /// Returns the number of bytes written.
    #[instrument(skip(self, destination), fields(destination = %destination.as_ref().display()))]
    pub async fn download_file(
        &self,
        file_id: &str,
        destination: impl AsRef<Path>,
    ) -> error_stack::Result<u64, DriveError> {
        let destination = destination.as_ref();
        let destination_str = destination.display().to_string();
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .get(format!("{}/{}", self.files_url(), file_id))
            .bearer_auth(&token)
            .query(&[("alt", "media")])
            .send()
            .await
            .change_context(DriveError::HttpError("files.get"))?;
        let mut response = Self::check_status(response, "files.get").await?;

        let total = response.content_length();
        let mut file = tokio::fs::File::create(destination)
            .await
            .change_context_lazy(|| DriveError::Io(destination_str.clone()))?;

        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .change_context(DriveError::HttpError("files.get"))?
        {
            file.write_all(&chunk)
                .await
                .change_context_lazy(|| DriveError::Io(destination_str.clone()))?;
            written += chunk.len() as u64;

            match total {
                Some(total) if total > 0 => {
                    tracing::info!("Download {}%.", written * 100 / total)
                }
                _ => tracing::info!("Downloaded {} bytes.", written),
            }
        }
        file.flush()
            .await
            .change_context_lazy(|| DriveError::Io(destination_str.clone()))?;

        Ok(written)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    pub(crate) struct FixedToken;

    #[async_trait::async_trait]
    impl TokenSource for FixedToken {
        async fn access_token(&self) -> error_stack::Result<String, DriveError> {
            Ok("test-token".to_owned())
        }
    }

    pub(crate) fn client(server: &MockServer) -> DriveClient<FixedToken> {
        DriveClient::with_base_url(FixedToken, &server.base_url()).unwrap()
    }

    fn file(id: &str, name: &str, mime_type: &str) -> serde_json::Value {
        json!({ "id": id, "name": name, "mimeType": mime_type })
    }

    #[test]
    fn test_quote_escapes_single_quotes() {
        assert_eq!(quote("Time.Graphics"), "'Time.Graphics'");
        assert_eq!(quote("Bob's"), "'Bob\\'s'");
    }

    #[tokio::test]
    async fn test_list_root_files_follows_pages() {
        let server = MockServer::start_async().await;
        // Registered first so the follow-up request matches it before the generic listing
        let second = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/drive/v3/files")
                    .query_param("pageToken", "page-2");
                then.status(200).json_body(json!({
                    "files": [file("2", "Archive", FOLDER_MIME_TYPE)]
                }));
            })
            .await;
        let first = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/drive/v3/files")
                    .header("authorization", "Bearer test-token")
                    .query_param("q", "'root' in parents and trashed = false");
                then.status(200).json_body(json!({
                    "files": [file("1", "Timeline", SPREADSHEET_MIME_TYPE)],
                    "nextPageToken": "page-2"
                }));
            })
            .await;

        let files = client(&server).list_root_files().await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "Timeline");
        assert!(files[1].is_folder());
        assert_eq!(
            files[1].to_string(),
            format!("Archive (ID: 2, Type: {})", FOLDER_MIME_TYPE)
        );
    }

    #[tokio::test]
    async fn test_list_files_in_missing_folder_is_empty() {
        let server = MockServer::start_async().await;
        let lookup = server
            .mock_async(|when, then| {
                when.method(GET).path("/drive/v3/files").query_param(
                    "q",
                    format!("name = 'Time.Graphics' and mimeType = '{}'", FOLDER_MIME_TYPE),
                );
                then.status(200).json_body(json!({ "files": [] }));
            })
            .await;

        let files = client(&server)
            .list_files_in_folder("Time.Graphics")
            .await
            .unwrap();

        lookup.assert_async().await;
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_list_files_in_folder() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/drive/v3/files").query_param(
                    "q",
                    format!("name = 'Time.Graphics' and mimeType = '{}'", FOLDER_MIME_TYPE),
                );
                then.status(200)
                    .json_body(json!({ "files": [file("f1", "Time.Graphics", FOLDER_MIME_TYPE)] }));
            })
            .await;
        let contents = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/drive/v3/files")
                    .query_param("q", "'f1' in parents");
                then.status(200)
                    .json_body(json!({ "files": [file("x1", "events.xlsx", XLSX_MIME_TYPE)] }));
            })
            .await;

        let files = client(&server)
            .list_files_in_folder("Time.Graphics")
            .await
            .unwrap();

        contents.assert_async().await;
        assert_eq!(
            files,
            vec![DriveFile {
                id: "x1".into(),
                name: "events.xlsx".into(),
                mime_type: XLSX_MIME_TYPE.into()
            }]
        );
    }

    #[tokio::test]
    async fn test_create_spreadsheet() {
        let server = MockServer::start_async().await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/drive/v3/files")
                    .json_body(json!({ "name": "Timeline", "mimeType": SPREADSHEET_MIME_TYPE }));
                then.status(200)
                    .json_body(file("new-id", "Timeline", SPREADSHEET_MIME_TYPE));
            })
            .await;

        let created = client(&server).create_spreadsheet("Timeline").await.unwrap();

        create.assert_async().await;
        assert_eq!(created.id, "new-id");
    }

    #[tokio::test]
    async fn test_delete_file_reports_status_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/drive/v3/files/gone");
                then.status(404).body("File not found");
            })
            .await;
        let deleted = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/drive/v3/files/abc");
                then.status(204);
            })
            .await;

        let drive = client(&server);
        drive.delete_file("abc").await.unwrap();
        deleted.assert_async().await;

        let report = drive.delete_file("gone").await.unwrap_err();
        assert!(matches!(
            report.current_context(),
            DriveError::HttpStatusError(message) if message.contains("404")
        ));
    }

    #[tokio::test]
    async fn test_download_file_writes_destination() {
        let server = MockServer::start_async().await;
        let content = vec![7u8; 4096];
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/drive/v3/files/xlsx-id")
                    .query_param("alt", "media");
                then.status(200).body(&content);
            })
            .await;
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("events.xlsx");

        let written = client(&server)
            .download_file("xlsx-id", &destination)
            .await
            .unwrap();

        assert_eq!(written, 4096);
        assert_eq!(std::fs::read(&destination).unwrap(), content);
    }
}
