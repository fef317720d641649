use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "sheets-timeline",
    about = "Copy Excel timelines into Google Sheets and manage the spreadsheets on Drive"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Clear the timeline range, then upload the Events and Periods sheets.
    Import {
        #[arg(long = "excel_file_path")]
        excel_file_path: PathBuf,
        #[arg(long = "spreadsheet_id")]
        spreadsheet_id: String,
    },
    /// Show rows added to Events and Periods between two snapshots.
    Compare {
        #[arg(long = "excel_file_path1")]
        excel_file_path1: PathBuf,
        #[arg(long = "excel_file_path2")]
        excel_file_path2: PathBuf,
    },
    /// Create an empty Google spreadsheet named after a local file.
    #[command(name = "createSheet")]
    CreateSheet {
        #[arg(long)]
        filename: PathBuf,
    },
    #[command(name = "deleteSheet")]
    DeleteSheet {
        #[arg(long = "file_id")]
        file_id: String,
    },
    /// Diff a local sheet against a range of a remote spreadsheet.
    #[command(name = "compareRemote")]
    CompareRemote {
        #[arg(long = "excel_file_path")]
        excel_file_path: PathBuf,
        #[arg(long = "spreadsheet_id")]
        spreadsheet_id: String,
        #[arg(long = "sheet_name")]
        sheet_name: String,
        /// A1 range holding the remote table, header row first.
        #[arg(long)]
        range: String,
        /// Columns to compare. Defaults to every column present on both sides.
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// List the root of the drive, the content of a folder, or every Excel file.
    #[command(name = "listFiles")]
    ListFiles {
        #[arg(long)]
        folder: Option<String>,
        #[arg(long, conflicts_with = "folder")]
        excel: bool,
    },
    Download {
        #[arg(long = "file_id")]
        file_id: String,
        #[arg(long)]
        destination: PathBuf,
    },
    /// Interactive terminal menu.
    Menu,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(std::iter::once("sheets-timeline").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_import_flags() {
        assert_eq!(
            parse(&["import", "--excel_file_path", "t.xlsx", "--spreadsheet_id", "abc"]),
            Command::Import {
                excel_file_path: "t.xlsx".into(),
                spreadsheet_id: "abc".to_owned(),
            }
        );
    }

    #[test]
    fn test_camel_case_subcommands() {
        assert_eq!(
            parse(&["createSheet", "--filename", "Timeline (1).xlsx"]),
            Command::CreateSheet {
                filename: "Timeline (1).xlsx".into()
            }
        );
        assert_eq!(
            parse(&["deleteSheet", "--file_id", "42"]),
            Command::DeleteSheet {
                file_id: "42".to_owned()
            }
        );
        assert_eq!(
            parse(&["listFiles"]),
            Command::ListFiles {
                folder: None,
                excel: false
            }
        );
        assert_eq!(
            parse(&["listFiles", "--excel"]),
            Command::ListFiles {
                folder: None,
                excel: true
            }
        );
    }

    #[test]
    fn test_compare_remote_splits_columns() {
        let command = parse(&[
            "compareRemote",
            "--excel_file_path",
            "t.xlsx",
            "--spreadsheet_id",
            "abc",
            "--sheet_name",
            "Events",
            "--range",
            "A1:D",
            "--columns",
            "Time,Name",
        ]);

        let Command::CompareRemote { columns, range, .. } = command else {
            panic!("unexpected command {:?}", command);
        };
        assert_eq!(columns, vec!["Time", "Name"]);
        assert_eq!(range, "A1:D");
    }

    #[test]
    fn test_missing_required_flag_is_rejected() {
        assert!(Cli::try_parse_from(["sheets-timeline", "compare", "--excel_file_path1", "a.xlsx"]).is_err());
        assert!(Cli::try_parse_from(["sheets-timeline", "unknown"]).is_err());
        assert!(
            Cli::try_parse_from(["sheets-timeline", "listFiles", "--folder", "A", "--excel"]).is_err()
        );
    }
}
