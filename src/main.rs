use std::{io, process::ExitCode};

use clap::Parser;
use error_stack::ResultExt;
use sheets_timeline::{
    cli::{Cli, Command},
    config::AppConfig,
    drive::DriveClient,
    logging,
    menu::{MenuApp, OAuthAuthorizer},
    routines::{
        CompareRemoteRoutine, CompareWorkbooksRoutine, CreateSheetRoutine, DeleteSheetRoutine,
        DownloadRoutine, ImportTimelineRoutine, ListFilesRoutine, ListScope, Routine, RoutineError,
    },
    sheets::{auth, http_client, SpreadsheetManager},
    source::ExcelWorkbook,
};
use tracing::Instrument;

type DriveRoutineClient = DriveClient<auth::GoogleAuthenticator>;

async fn service_drive(config: &AppConfig) -> error_stack::Result<DriveRoutineClient, RoutineError> {
    let client = http_client::http_client()
        .change_context(RoutineError::routine_failure("Could not create the HTTP client"))?;
    let authenticator = auth::service_account(&config.google, client)
        .await
        .change_context(RoutineError::routine_failure("Could not authenticate with Google"))?;
    DriveClient::new(authenticator)
        .change_context(RoutineError::routine_failure("Could not create the Drive client"))
}

async fn spreadsheet(
    spreadsheet_id: &str,
    config: &AppConfig,
) -> error_stack::Result<SpreadsheetManager, RoutineError> {
    SpreadsheetManager::new(spreadsheet_id, &config.google)
        .await
        .change_context_lazy(|| {
            RoutineError::routine_failure(format!("Could not open spreadsheet {}", spreadsheet_id))
        })
}

fn workbook(
    path: &std::path::Path,
) -> error_stack::Result<sheets_timeline::source::Workbook, RoutineError> {
    ExcelWorkbook::open(path).change_context_lazy(|| {
        RoutineError::routine_failure(format!("Could not open {}", path.display()))
    })
}

async fn build_routine(
    command: Command,
    config: &AppConfig,
) -> error_stack::Result<Box<dyn Routine>, RoutineError> {
    let routine: Box<dyn Routine> = match command {
        Command::Import {
            excel_file_path,
            spreadsheet_id,
        } => Box::new(ImportTimelineRoutine::new(
            workbook(&excel_file_path)?,
            spreadsheet(&spreadsheet_id, config).await?,
            config.transfer.clone(),
        )),
        Command::Compare {
            excel_file_path1,
            excel_file_path2,
        } => Box::new(CompareWorkbooksRoutine::new(excel_file_path1, excel_file_path2)),
        Command::CreateSheet { filename } => {
            Box::new(CreateSheetRoutine::new(service_drive(config).await?, filename))
        }
        Command::DeleteSheet { file_id } => {
            Box::new(DeleteSheetRoutine::new(service_drive(config).await?, &file_id))
        }
        Command::CompareRemote {
            excel_file_path,
            spreadsheet_id,
            sheet_name,
            range,
            columns,
        } => Box::new(CompareRemoteRoutine::new(
            workbook(&excel_file_path)?,
            spreadsheet(&spreadsheet_id, config).await?,
            &sheet_name,
            &range,
            columns,
        )),
        Command::ListFiles { folder, excel } => {
            let scope = match (folder, excel) {
                (Some(folder), _) => ListScope::Folder(folder),
                (None, true) => ListScope::ExcelFiles,
                (None, false) => ListScope::Root,
            };
            Box::new(ListFilesRoutine::new(service_drive(config).await?, scope))
        }
        Command::Download {
            file_id,
            destination,
        } => Box::new(DownloadRoutine::new(
            service_drive(config).await?,
            &file_id,
            destination,
        )),
        Command::Menu => {
            return Err(error_stack::report!(RoutineError::routine_failure(
                "The menu is not a routine"
            )))
        }
    };
    Ok(routine)
}

async fn run_menu(config: &AppConfig) -> error_stack::Result<(), RoutineError> {
    let drive = service_drive(config).await?;
    let stdin = io::stdin();
    let mut app = MenuApp::new(
        stdin.lock(),
        io::stdout(),
        config.menu.page_size,
        Box::new(drive),
        Box::new(OAuthAuthorizer::new(config.google.clone())),
    );
    app.run()
        .await
        .change_context(RoutineError::routine_failure("Menu stopped unexpectedly"))
}

async fn run(command: Command, config: &AppConfig) -> error_stack::Result<(), RoutineError> {
    if command == Command::Menu {
        return run_menu(config).await;
    }

    let routine = build_routine(command, config).await?;
    let result = routine
        .run()
        .instrument(tracing::info_span!("routine", routine = routine.name()))
        .await;
    match &result {
        Ok(()) => tracing::info!("✅ {}: OK", routine.name()),
        Err(report) => tracing::error!("❌ {}: {}", routine.name(), report),
    }
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(report) => {
            eprintln!("{:?}", report);
            return ExitCode::FAILURE;
        }
    };
    if let Err(report) = logging::init(&config.logging) {
        eprintln!("{:?}", report);
        return ExitCode::FAILURE;
    }

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            tracing::error!("{:?}", report);
            ExitCode::FAILURE
        }
    }
}
