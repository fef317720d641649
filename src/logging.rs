use error_stack::ResultExt;
use thiserror::Error;
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    fmt::{
        self,
        format::{Format, FormatEvent, FormatFields, Writer},
        FmtContext,
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::config::app_config::LoggingConfig;

pub const DEFAULT_FILTER: &str = "sheets_timeline=info";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to create log file '{0}'")]
    LogFile(String),
    #[error("A global subscriber is already installed")]
    AlreadyInitialized,
}

/// Indents each event under the spans it was emitted in.
pub struct PrettyFormatter {
    inner: Format,
}

impl PrettyFormatter {
    pub fn new(ansi: bool) -> Self {
        Self {
            inner: fmt::format()
                .with_ansi(ansi)
                .with_target(false)
                .with_file(false)
                .with_line_number(false)
                .with_level(true)
                .with_source_location(false),
        }
    }
}

impl<S, N> FormatEvent<S, N> for PrettyFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let depth = ctx.event_scope().map(|scope| scope.count()).unwrap_or(0);

        write!(writer, "{}", indent(depth))?;
        self.inner.format_event(ctx, writer, event)
    }
}

fn indent(depth: usize) -> String {
    match depth {
        0 => String::new(),
        depth => format!("{}└─ ", "  ".repeat(depth - 1)),
    }
}

/// Installs the global subscriber: `RUST_LOG` (or [`DEFAULT_FILTER`]) on stderr, plus an
/// uncolored copy in the configured log file.
pub fn init(config: &LoggingConfig) -> error_stack::Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stderr_layer = fmt::layer()
        .event_format(PrettyFormatter::new(true))
        .with_writer(std::io::stderr);

    let file_layer = match config.file.as_deref() {
        Some(path) => {
            let file = std::fs::File::create(path)
                .change_context_lazy(|| LoggingError::LogFile(path.to_owned()))?;
            Some(
                fmt::layer()
                    .event_format(PrettyFormatter::new(false))
                    .with_writer(file)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    Registry::default()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .change_context(LoggingError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_grows_with_span_depth() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(1), "└─ ");
        assert_eq!(indent(3), "    └─ ");
    }

    #[test]
    fn test_unwritable_log_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("app.log");
        let config = LoggingConfig {
            file: Some(path.display().to_string().into()),
        };

        let report = init(&config).unwrap_err();

        assert!(matches!(report.current_context(), LoggingError::LogFile(_)));
    }
}
