// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Color handling, logging to stderr, and where the report is written.

use clap::{Args, ValueEnum};
use owo_colors::{OwoColorize, Style, style};
use std::{
    fmt,
    io::{self, BufWriter, Write},
    sync::Once,
};
use tracing::{Event, Level, Subscriber, level_filters::LevelFilter, warn};
use tracing_subscriber::{
    Layer,
    filter::Targets,
    fmt::{FmtContext, FormatEvent, FormatFields, format},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Log events with this target are printed without a level prefix.
pub(crate) const NO_HEADING_TARGET: &str = "testtree::no_heading";

/// Holds log filter directives, e.g. `testtree_core=trace`.
const LOG_ENV: &str = "TESTTREE_LOG";

#[derive(Copy, Clone, Debug, Args)]
#[must_use]
pub(crate) struct OutputOpts {
    /// Also log debug messages, such as how many records and groups were read
    #[arg(long, short, env = "TESTTREE_VERBOSE")]
    pub(crate) verbose: bool,

    /// Produce color output
    #[arg(
        long,
        value_enum,
        default_value_t,
        value_name = "WHEN",
        env = "CARGO_TERM_COLOR"
    )]
    pub(crate) color: Color,
}

impl OutputOpts {
    pub(crate) fn init(self) -> OutputContext {
        init_logger(
            self.color.should_colorize(supports_color::Stream::Stderr),
            self.verbose,
        );
        OutputContext { color: self.color }
    }
}

/// Output settings, resolved from the command line and environment.
#[derive(Copy, Clone, Debug)]
#[must_use]
pub struct OutputContext {
    pub(crate) color: Color,
}

impl OutputContext {
    /// Returns styles for errors printed to stderr.
    pub fn stderr_styles(&self) -> StderrStyles {
        let mut styles = StderrStyles::default();
        if self.color.should_colorize(supports_color::Stream::Stderr) {
            styles.bold = style().bold();
        }
        styles
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
#[must_use]
pub enum Color {
    #[default]
    Auto,
    Always,
    Never,
}

impl Color {
    pub(crate) fn should_colorize(self, stream: supports_color::Stream) -> bool {
        match self {
            Color::Auto => supports_color::on_cached(stream).is_some(),
            Color::Always => true,
            Color::Never => false,
        }
    }
}

static INIT_LOGGER: Once = Once::new();

fn init_logger(colorize: bool, verbose: bool) {
    INIT_LOGGER.call_once(|| {
        let env = std::env::var(LOG_ENV).ok();
        let (targets, invalid) = log_targets(env.as_deref(), verbose);

        let layer = tracing_subscriber::fmt::layer()
            .event_format(LogFormatter { colorize })
            .with_writer(io::stderr)
            .with_filter(targets);
        tracing_subscriber::registry().with(layer).init();

        if let Some(value) = invalid {
            warn!("ignoring invalid {LOG_ENV} value `{value}`");
        }
    });
}

/// Parses `TESTTREE_LOG` directives, falling back to `info` (`debug` if verbose).
///
/// An unparseable value is returned alongside the fallback so it can be reported once logging is
/// up.
fn log_targets(env: Option<&str>, verbose: bool) -> (Targets, Option<&str>) {
    let fallback = Targets::new().with_default(if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    });

    match env {
        None | Some("") => (fallback, None),
        Some(value) => match value.parse::<Targets>() {
            Ok(targets) => (targets, None),
            Err(_) => (fallback, Some(value)),
        },
    }
}

/// Writes each event as `<level>: <message>` on its own line.
struct LogFormatter {
    colorize: bool,
}

impl LogFormatter {
    fn heading(&self, level: Level) -> (&'static str, Style) {
        let (heading, colored) = match level {
            Level::ERROR => ("error", style().red().bold()),
            Level::WARN => ("warning", style().yellow().bold()),
            Level::INFO => ("info", style().bold()),
            Level::DEBUG => ("debug", style().bold()),
            Level::TRACE => ("trace", style().dimmed()),
        };
        (heading, if self.colorize { colored } else { Style::new() })
    }
}

impl<S, N> FormatEvent<S, N> for LogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        if metadata.target() != NO_HEADING_TARGET {
            let (heading, style) = self.heading(*metadata.level());
            write!(writer, "{}: ", heading.style(style))?;
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Styles for errors printed to stderr.
#[derive(Debug, Default)]
pub struct StderrStyles {
    pub(crate) bold: Style,
}

/// Where the report is written.
#[derive(Default)]
pub enum OutputWriter {
    /// Standard output.
    #[default]
    Normal,
    /// An in-memory buffer.
    #[cfg(test)]
    Test {
        /// Everything written so far.
        stdout: Vec<u8>,
    },
}

impl OutputWriter {
    pub(crate) fn stdout_writer(&mut self) -> Box<dyn Write + '_> {
        match self {
            Self::Normal => Box::new(BufWriter::new(io::stdout().lock())),
            #[cfg(test)]
            Self::Test { stdout } => Box::new(stdout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use tracing::{debug, error, info};

    #[test]
    fn log_targets_fallback() {
        let (targets, invalid) = log_targets(None, false);
        assert_eq!(invalid, None);
        assert!(targets.would_enable("testtree_core::collect", &Level::INFO));
        assert!(!targets.would_enable("testtree_core::collect", &Level::DEBUG));

        let (targets, invalid) = log_targets(Some(""), true);
        assert_eq!(invalid, None);
        assert!(targets.would_enable("testtree_core::collect", &Level::DEBUG));
        assert!(!targets.would_enable("testtree_core::assemble", &Level::TRACE));
    }

    #[test]
    fn log_targets_from_env() {
        let (targets, invalid) = log_targets(Some("testtree_core::assemble=trace"), false);
        assert_eq!(invalid, None);
        assert!(targets.would_enable("testtree_core::assemble", &Level::TRACE));
        assert!(!targets.would_enable("testtree_core::collect", &Level::ERROR));

        let (targets, invalid) = log_targets(Some("testtree=loud"), true);
        assert_eq!(invalid, Some("testtree=loud"));
        assert!(targets.would_enable("testtree_core::collect", &Level::DEBUG));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .expect("buffer lock is not poisoned")
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn formatter_headings() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(LogFormatter { colorize: false })
                .with_writer(move || writer.clone())
                .with_filter(LevelFilter::DEBUG),
        );

        tracing::subscriber::with_default(subscriber, || {
            error!("failed to parse event stream");
            error!(target: NO_HEADING_TARGET, "  caused by: line 3: error decoding record");
            warn!("test `pkg::T`: `run` record follows a terminal record");
            info!("assembled");
            debug!("collected 4 records");
        });

        let logs = String::from_utf8(captured.0.lock().expect("lock").clone()).expect("UTF-8");
        assert_eq!(
            logs,
            "error: failed to parse event stream\n\
             \x20 caused by: line 3: error decoding record\n\
             warning: test `pkg::T`: `run` record follows a terminal record\n\
             info: assembled\n\
             debug: collected 4 records\n"
        );
    }
}
