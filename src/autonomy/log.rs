//! Decision log: `<ISO timestamp> - AUTONOME - <LEVEL> - <message>`, one
//! event per line.

use std::fmt;
use std::path::Path;

use chrono::Local;
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

pub const LOG_FILE: &str = "autonomous_decisions.log";

pub struct AutonomeFormat;

impl<S, N> FormatEvent<S, N> for AutonomeFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} - AUTONOME - {} - ",
            Local::now().format("%Y-%m-%dT%H:%M:%S%.6f"),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Non-rolling appender on `<dir>/autonomous_decisions.log`. Keep the guard
/// alive for the whole run or buffered lines are lost.
pub fn file_writer(dir: &Path) -> (NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    tracing_appender::non_blocking(appender)
}
