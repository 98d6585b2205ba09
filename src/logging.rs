// Console logging: every event becomes one `[LEVEL] message` line on
// stdout. `[FATAL]` is an error event sent to the `fatal` target.

use std::fmt;
use std::io::IsTerminal;

use crossterm::style::Stylize;
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Target of events that end the run.
pub const FATAL: &str = "fatal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Tag {
    fn of(meta: &Metadata<'_>) -> Tag {
        match *meta.level() {
            Level::ERROR if meta.target() == FATAL => Tag::Fatal,
            Level::ERROR => Tag::Error,
            Level::WARN => Tag::Warning,
            Level::INFO => Tag::Info,
            _ => Tag::Debug,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Tag::Debug => "[DEBUG]",
            Tag::Info => "[INFO]",
            Tag::Warning => "[WARNING]",
            Tag::Error => "[ERROR]",
            Tag::Fatal => "[FATAL]",
        }
    }

    fn write_styled(self, w: &mut Writer<'_>) -> fmt::Result {
        let label = self.label();
        match self {
            Tag::Debug => write!(w, "{}", label.dark_grey()),
            Tag::Info => write!(w, "{}", label.green()),
            Tag::Warning => write!(w, "{}", label.yellow()),
            Tag::Error => write!(w, "{}", label.red()),
            Tag::Fatal => write!(w, "{}", label.red().bold()),
        }
    }
}

/// Event formatter producing `[LEVEL] message` lines without timestamps.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
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
        let tag = Tag::of(event.metadata());
        if writer.has_ansi_escapes() {
            tag.write_styled(&mut writer)?;
        } else {
            write!(writer, "{}", tag.label())?;
        }
        write!(writer, " ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the console subscriber. Colours are used only on a terminal.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(std::io::stdout().is_terminal())
        .with_writer(std::io::stdout)
        .event_format(ConsoleFormat)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::{error, info, warn};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn lines_carry_level_tags() {
        let out = Captured::default();
        let sink = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .event_format(ConsoleFormat)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            info!("Authenticated successfully.");
            warn!("No valid asset entries found.");
            error!("Failed to update asset 7.");
            error!(target: FATAL, "Exiting due to authentication failure.");
        });

        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "[INFO] Authenticated successfully.",
                "[WARNING] No valid asset entries found.",
                "[ERROR] Failed to update asset 7.",
                "[FATAL] Exiting due to authentication failure.",
            ]
        );
    }
}
