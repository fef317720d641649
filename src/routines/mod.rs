pub mod compare_remote;
pub mod compare_workbooks;
pub mod drive_files;
pub mod import_timeline;
pub mod routine;

pub use compare_remote::{CompareRemoteRoutine, RemoteTable};
pub use compare_workbooks::CompareWorkbooksRoutine;
pub use drive_files::{
    CreateSheetRoutine, DeleteSheetRoutine, DownloadRoutine, ListFilesRoutine, ListScope,
};
pub use import_timeline::ImportTimelineRoutine;
pub use routine::{Routine, RoutineError};
