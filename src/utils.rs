use std::{path::Path, sync::LazyLock};

use regex::Regex;

static COPY_SUFFIX_OR_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" \(\d+\)|\.\w+$").unwrap());

/// Basename of `path` without ` (N)` copy markers and without its extension.
///
/// `/downloads/Timeline (2).xlsx` becomes `Timeline`.
pub fn clean_filename(path: impl AsRef<Path>) -> String {
    let filename = path
        .as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    COPY_SUFFIX_OR_EXTENSION
        .replace_all(&filename, "")
        .into_owned()
}
