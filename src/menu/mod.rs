//! Line-driven terminal menu over the Drive utilities.

pub mod screen;

use std::io::{BufRead, Write};

use error_stack::ResultExt;
use thiserror::Error;
use tracing::instrument;

use crate::{
    config::google_config::GoogleConfig,
    drive::{DriveClient, DriveError, DriveFile, TokenSource},
    sheets::{auth, http_client},
};

pub const MENU_ITEMS: [&str; 3] = ["Authorize OAuth", "List Root Files", "Exit"];

const AUTHORIZE: usize = 0;
const LIST_ROOT_FILES: usize = 1;
const EXIT: usize = 2;

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Terminal I/O failed")]
    Io,
    #[error("OAuth authorization failed")]
    Authorization,
}

#[async_trait::async_trait]
pub trait FileLister: Send + Sync {
    async fn list_root_files(&self) -> error_stack::Result<Vec<DriveFile>, DriveError>;
}

#[async_trait::async_trait]
impl<T: TokenSource> FileLister for DriveClient<T> {
    async fn list_root_files(&self) -> error_stack::Result<Vec<DriveFile>, DriveError> {
        DriveClient::list_root_files(self).await
    }
}

/// Produces a user-authorized lister, prompting for consent when needed.
#[async_trait::async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self) -> error_stack::Result<Box<dyn FileLister>, MenuError>;
}

/// Runs the installed-app OAuth flow against the configured client secret.
pub struct OAuthAuthorizer {
    config: GoogleConfig,
}

impl OAuthAuthorizer {
    pub fn new(config: GoogleConfig) -> Self {
        OAuthAuthorizer { config }
    }
}

#[async_trait::async_trait]
impl Authorizer for OAuthAuthorizer {
    async fn authorize(&self) -> error_stack::Result<Box<dyn FileLister>, MenuError> {
        let client = http_client::http_client().change_context(MenuError::Authorization)?;
        let authenticator = auth::installed_flow(&self.config, client)
            .await
            .change_context(MenuError::Authorization)?;
        let drive = DriveClient::new(authenticator).change_context(MenuError::Authorization)?;
        Ok(Box::new(drive))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Up,
    Down,
    Enter,
    Select(usize),
    Unknown,
}

impl Command {
    fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" => Command::Enter,
            "u" | "k" | "up" => Command::Up,
            "d" | "j" | "down" => Command::Down,
            other => match other.parse::<usize>() {
                Ok(n) if (1..=MENU_ITEMS.len()).contains(&n) => Command::Select(n - 1),
                _ => Command::Unknown,
            },
        }
    }
}

pub struct MenuApp<R, W> {
    input: R,
    output: W,
    current_row: usize,
    status_message: String,
    page_size: usize,
    service_lister: Box<dyn FileLister>,
    oauth_lister: Option<Box<dyn FileLister>>,
    authorizer: Box<dyn Authorizer>,
}

impl<R: BufRead, W: Write> MenuApp<R, W> {
    pub fn new(
        input: R,
        output: W,
        page_size: usize,
        service_lister: Box<dyn FileLister>,
        authorizer: Box<dyn Authorizer>,
    ) -> Self {
        MenuApp {
            input,
            output,
            current_row: 0,
            status_message: "Ready. Select an option.".to_owned(),
            page_size: page_size.max(1),
            service_lister,
            oauth_lister: None,
            authorizer,
        }
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn is_authorized(&self) -> bool {
        self.oauth_lister.is_some()
    }

    /// `None` at end of input.
    fn read_line(&mut self) -> error_stack::Result<Option<String>, MenuError> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .change_context(MenuError::Io)?;
        Ok((read > 0).then_some(line))
    }

    /// Main loop; returns when `Exit` is chosen or the input ends.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> error_stack::Result<(), MenuError> {
        loop {
            screen::display_menu(&mut self.output, &MENU_ITEMS, self.current_row)
                .change_context(MenuError::Io)?;
            screen::display_status(&mut self.output, &self.status_message)
                .change_context(MenuError::Io)?;

            let Some(line) = self.read_line()? else {
                self.status_message = "Exiting...".to_owned();
                break;
            };

            match Command::parse(&line) {
                Command::Up if self.current_row > 0 => {
                    self.current_row -= 1;
                    self.status_message = "Moving up in menu...".to_owned();
                }
                Command::Down if self.current_row < MENU_ITEMS.len() - 1 => {
                    self.current_row += 1;
                    self.status_message = "Moving down in menu...".to_owned();
                }
                Command::Up | Command::Down => {}
                Command::Enter => self.handle_menu_selection().await?,
                Command::Select(row) => {
                    self.current_row = row;
                    self.handle_menu_selection().await?;
                }
                Command::Unknown => {
                    self.status_message = format!("Unknown command: {}", line.trim());
                }
            }

            if self.current_row == EXIT && self.status_message == "Exiting..." {
                break;
            }
        }
        Ok(())
    }

    async fn handle_menu_selection(&mut self) -> error_stack::Result<(), MenuError> {
        match self.current_row {
            AUTHORIZE => self.authorize().await,
            LIST_ROOT_FILES => self.list_root_files().await,
            _ => {
                self.status_message = "Exiting...".to_owned();
                Ok(())
            }
        }
    }

    async fn authorize(&mut self) -> error_stack::Result<(), MenuError> {
        if self.oauth_lister.is_some() {
            self.status_message = "Already authorized.".to_owned();
            return Ok(());
        }

        self.status_message = "Authenticating with OAuth...".to_owned();
        screen::display_status(&mut self.output, &self.status_message).change_context(MenuError::Io)?;

        match self.authorizer.authorize().await {
            Ok(lister) => {
                self.oauth_lister = Some(lister);
                self.status_message = "OAuth authorization complete.".to_owned();
            }
            Err(report) => {
                tracing::error!("{:?}", report);
                self.status_message = "OAuth authorization failed.".to_owned();
            }
        }
        Ok(())
    }

    async fn list_root_files(&mut self) -> error_stack::Result<(), MenuError> {
        self.status_message = "Listing root files...".to_owned();

        let lister = self.oauth_lister.as_deref().unwrap_or(&*self.service_lister);
        let files = match lister.list_root_files().await {
            Ok(files) => files,
            Err(report) => {
                tracing::error!("{:?}", report);
                Vec::new()
            }
        };

        for page in files.chunks(self.page_size) {
            screen::display_page(&mut self.output, page).change_context(MenuError::Io)?;
            if self.read_line()?.is_none() {
                break;
            }
        }

        self.status_message = format!("Displayed {} root files.", files.len());
        Ok(())
    }
}
