use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// One-line log format: `ℹ️  INFO [12:00:00] testomat: message`
pub struct ReporterFormatter {
    /// Print the module path of the event
    pub with_target: bool,
}

impl<S, N> FormatEvent<S, N> for ReporterFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let timestamp = Local::now().format("%H:%M:%S");

        let (emoji, level_str) = level_label(metadata.level());
        write!(writer, "{} {} [{}] testomat: ", emoji, level_str, timestamp)?;

        if self.with_target {
            write!(writer, "{}: ", metadata.target())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

fn level_label(level: &Level) -> (&'static str, &'static str) {
    match *level {
        Level::TRACE => ("🔬", "TRACE"),
        Level::DEBUG => ("🐛", "DEBUG"),
        Level::INFO => ("ℹ️ ", "INFO"),
        Level::WARN => ("⚠️ ", "WARN"),
        Level::ERROR => ("❌", "ERROR"),
    }
}

/// Default filter directive; `RUST_LOG` overrides it
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "testomat_reporter=debug,warn"
    } else {
        "testomat_reporter=info,warn"
    }
}

/// Install the global subscriber, writing to stderr so stdout stays free for `--echo`
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .event_format(ReporterFormatter {
            with_target: verbose,
        })
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
