use std::io::{self, Write};

use crate::drive::DriveFile;

pub const FILES_HEADER: &str = "Files and folders in the root directory:";
pub const NEXT_PAGE_PROMPT: &str = "Press Enter for next page...";
pub const MENU_HINT: &str = "[u] up  [d] down  [Enter] select  [1-9] jump and select";

/// Draws the menu with the selected row marked.
pub fn display_menu<W: Write>(out: &mut W, items: &[&str], current_row: usize) -> io::Result<()> {
    writeln!(out)?;
    for (idx, item) in items.iter().enumerate() {
        let marker = if idx == current_row { '>' } else { ' ' };
        writeln!(out, "{} {}. {}", marker, idx + 1, item)?;
    }
    writeln!(out, "{}", MENU_HINT)
}

pub fn display_status<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "-- {}", message)?;
    out.flush()
}

/// One page of the file listing.
pub fn display_page<W: Write>(out: &mut W, page: &[DriveFile]) -> io::Result<()> {
    writeln!(out, "{}", FILES_HEADER)?;
    for file in page {
        writeln!(out, "{}", file)?;
    }
    writeln!(out, "{}", NEXT_PAGE_PROMPT)?;
    out.flush()
}
