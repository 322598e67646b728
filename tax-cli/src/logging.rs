//! Process-wide logging: a stderr console plus an optional append-only file.
//!
//! Both sinks share one reloadable level filter. The console can be muted
//! on its own, and the file sink discards output until a path is set.

use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::{FmtContext, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, reload};

/// Filter used when neither `RUST_LOG` nor a configured level is given.
pub const DEFAULT_LEVEL: &str = "info";

static LEVEL: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();
static CONSOLE_ENABLED: AtomicBool = AtomicBool::new(true);
static LOG_FILE: Mutex<Option<File>> = Mutex::new(None);

/// `<local time> <LEVEL> <target>: <fields>`, one event per line.
struct EventLine;

impl<S, N> FormatEvent<S, N> for EventLine
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
        let meta = event.metadata();
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");

        if writer.has_ansi_escapes() {
            write!(
                writer,
                "\x1b[2m{timestamp}\x1b[0m {}{:<5}\x1b[0m \x1b[36m{}\x1b[0m: ",
                level_color(meta.level()),
                meta.level(),
                meta.target()
            )?;
        } else {
            write!(writer, "{timestamp} {:<5} {}: ", meta.level(), meta.target())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_color(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

fn lock_log_file() -> MutexGuard<'static, Option<File>> {
    LOG_FILE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writes to the current log file, or nowhere while none is open.
struct LogFile;

struct LogFileGuard(MutexGuard<'static, Option<File>>);

impl Write for LogFileGuard {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match &mut *self.0 {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *self.0 {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileGuard;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileGuard(lock_log_file())
    }
}

/// Replaces the active filter. Accepts a bare level such as `debug` or any
/// `EnvFilter` directive such as `tax_core=trace,warn`.
pub fn set_log_level(directives: &str) -> Result<()> {
    let handle = LEVEL
        .get()
        .ok_or_else(|| anyhow!("logging not yet initialized"))?;
    let filter = EnvFilter::try_new(directives)
        .with_context(|| format!("invalid log level '{directives}'"))?;
    handle.reload(filter).context("filter reload failed")
}

/// Mutes or unmutes the console. The log file is unaffected.
pub fn set_console_enabled(enabled: bool) {
    CONSOLE_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Appends log output to `path`, replacing any file already open.
/// The parent directory must exist.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))?;
    *lock_log_file() = Some(file);
    Ok(())
}

/// Installs the global subscriber. Later calls are no-ops.
///
/// The console writes to stderr so results on stdout stay clean, with color
/// only on a terminal. The starting level comes from `RUST_LOG`, falling back
/// to [`DEFAULT_LEVEL`].
pub fn init_default_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
    let (level_layer, level_handle) = reload::Layer::new(filter);

    let console = tracing_subscriber::fmt::layer()
        .event_format(EventLine)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .with_filter(filter_fn(|_| CONSOLE_ENABLED.load(Ordering::Relaxed)));

    let file = tracing_subscriber::fmt::layer()
        .event_format(EventLine)
        .with_ansi(false)
        .with_writer(LogFile);

    let installed = tracing_subscriber::registry()
        .with(level_layer)
        .with(console)
        .with(file)
        .try_init()
        .is_ok();
    if installed {
        let _ = LEVEL.set(level_handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_accepts_bare_levels_and_directives() {
        init_default_logging();

        assert!(set_log_level("debug").is_ok());
        assert!(set_log_level("tax_core=trace,warn").is_ok());
    }

    #[test]
    fn invalid_level_is_rejected() {
        init_default_logging();

        assert!(set_log_level("tax_core=loud").is_err());
    }

    #[test]
    fn console_toggle_flips_flag() {
        set_console_enabled(false);
        assert!(!CONSOLE_ENABLED.load(Ordering::Relaxed));

        set_console_enabled(true);
        assert!(CONSOLE_ENABLED.load(Ordering::Relaxed));
    }

    #[test]
    fn file_logging_requires_existing_directory() {
        let result = enable_file_logging(Path::new("/this/path/does/not/exist/app.log"));

        assert!(result.is_err());
    }
}
