//! One-shot Drive file operations exposed on the command line.

use std::path::PathBuf;

use error_stack::{report, ResultExt};

use super::routine::{Routine, RoutineError};
use crate::{
    drive::{DriveClient, TokenSource},
    utils::clean_filename,
};

/// Creates an empty spreadsheet named after a local file, without its copy suffix or extension.
pub struct CreateSheetRoutine<T: TokenSource> {
    drive: DriveClient<T>,
    filename: PathBuf,
}

impl<T: TokenSource> CreateSheetRoutine<T> {
    pub fn new(drive: DriveClient<T>, filename: impl Into<PathBuf>) -> Self {
        CreateSheetRoutine {
            drive,
            filename: filename.into(),
        }
    }
}

#[async_trait::async_trait]
impl<T: TokenSource> Routine for CreateSheetRoutine<T> {
    fn name(&self) -> &str {
        "CreateSheetRoutine"
    }

    async fn run(&self) -> error_stack::Result<(), RoutineError> {
        let name = clean_filename(&self.filename);
        if name.is_empty() {
            return Err(report!(RoutineError::routine_failure(format!(
                "No spreadsheet name can be derived from '{}'",
                self.filename.display()
            ))));
        }

        let file = self
            .drive
            .create_spreadsheet(&name)
            .await
            .change_context_lazy(|| {
                RoutineError::routine_failure(format!("Could not create spreadsheet {}", name))
            })?;

        println!("Created spreadsheet: {}", file);
        Ok(())
    }
}

pub struct DeleteSheetRoutine<T: TokenSource> {
    drive: DriveClient<T>,
    file_id: String,
}

impl<T: TokenSource> DeleteSheetRoutine<T> {
    pub fn new(drive: DriveClient<T>, file_id: &str) -> Self {
        DeleteSheetRoutine {
            drive,
            file_id: file_id.to_owned(),
        }
    }
}

#[async_trait::async_trait]
impl<T: TokenSource> Routine for DeleteSheetRoutine<T> {
    fn name(&self) -> &str {
        "DeleteSheetRoutine"
    }

    async fn run(&self) -> error_stack::Result<(), RoutineError> {
        self.drive
            .delete_file(&self.file_id)
            .await
            .change_context_lazy(|| {
                RoutineError::routine_failure(format!("Could not delete file {}", self.file_id))
            })?;

        println!("Deleted file {}", self.file_id);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    Root,
    Folder(String),
    /// `.xlsx` and `.xls` files anywhere on the drive
    ExcelFiles,
}

pub struct ListFilesRoutine<T: TokenSource> {
    drive: DriveClient<T>,
    scope: ListScope,
}

impl<T: TokenSource> ListFilesRoutine<T> {
    pub fn new(drive: DriveClient<T>, scope: ListScope) -> Self {
        ListFilesRoutine { drive, scope }
    }
}

#[async_trait::async_trait]
impl<T: TokenSource> Routine for ListFilesRoutine<T> {
    fn name(&self) -> &str {
        "ListFilesRoutine"
    }

    async fn run(&self) -> error_stack::Result<(), RoutineError> {
        let files = match &self.scope {
            ListScope::Root => self.drive.list_root_files().await,
            ListScope::Folder(folder) => self.drive.list_files_in_folder(folder).await,
            ListScope::ExcelFiles => self.drive.list_excel_files().await,
        }
        .change_context(RoutineError::routine_failure("Could not list files"))?;

        if files.is_empty() {
            println!("No files found.");
        }
        for file in &files {
            println!("{}", file);
        }
        Ok(())
    }
}

pub struct DownloadRoutine<T: TokenSource> {
    drive: DriveClient<T>,
    file_id: String,
    destination: PathBuf,
}

impl<T: TokenSource> DownloadRoutine<T> {
    pub fn new(drive: DriveClient<T>, file_id: &str, destination: impl Into<PathBuf>) -> Self {
        DownloadRoutine {
            drive,
            file_id: file_id.to_owned(),
            destination: destination.into(),
        }
    }
}

#[async_trait::async_trait]
impl<T: TokenSource> Routine for DownloadRoutine<T> {
    fn name(&self) -> &str {
        "DownloadRoutine"
    }

    async fn run(&self) -> error_stack::Result<(), RoutineError> {
        let bytes = self
            .drive
            .download_file(&self.file_id, &self.destination)
            .await
            .change_context_lazy(|| {
                RoutineError::routine_failure(format!("Could not download file {}", self.file_id))
            })?;

        println!(
            "Downloaded {} bytes to {}",
            bytes,
            self.destination.display()
        );
        Ok(())
    }
}
