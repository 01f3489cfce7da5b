//! Logging infrastructure: tracing subscriber with gantry console output.
//!
//! All engine modules log through the [`tracing`] macros; this module owns
//! the console formatter and the mapping from the `--log` CLI flag to a
//! [`tracing_subscriber`] level filter.

use clap::ValueEnum;
use tracing_subscriber::filter::LevelFilter;

/// Console log level, set by the `--log` global flag.
///
/// `None` disables console output entirely.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[value(rename_all = "UPPER")]
pub enum LogLevel {
    /// Everything, including per-node execution tracing.
    #[default]
    Debug,
    /// Informational messages and above.
    Info,
    /// Warnings and errors only.
    Warn,
    /// Errors only.
    Error,
    /// No console output.
    None,
}

impl LogLevel {
    /// The [`LevelFilter`] corresponding to this level.
    #[must_use]
    pub const fn filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warn => LevelFilter::WARN,
            Self::Error => LevelFilter::ERROR,
            Self::None => LevelFilter::OFF,
        }
    }
}

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] that emits gantry-style
/// console output.
struct GantryFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for GantryFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let level = *event.metadata().level();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = &extractor.message;

        match level {
            tracing::Level::ERROR => writeln!(writer, "\x1b[91mERROR\x1b[0m {msg}"),
            tracing::Level::WARN => writeln!(writer, "\x1b[93mWARN\x1b[0m  {msg}"),
            tracing::Level::INFO => writeln!(writer, "{msg}"),
            _ => writeln!(writer, "\x1b[90m{msg}\x1b[0m"),
        }
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Sets up a console subscriber that formats events in the gantry output
/// style, filtered to `level`. Warnings and errors go to stderr, everything
/// else to stdout. Must be called once at program startup, before any
/// logging.
pub fn init_subscriber(level: LogLevel) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
    };

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(GantryFormatter)
        .with_writer(make_writer)
        .with_filter(level.filter());

    tracing_subscriber::registry().with(console_layer).init();
}
