// A stderr logger for the `log` facade. Filtering happens through
// `log::set_max_level` in `main`.

use std::{
    path::{Path, PathBuf},
    sync::{LazyLock, Mutex},
};

use {jiff::tz::TimeZone, log::Log};

use crate::style::Theme;

/// Writes each record to stderr, prefixed by a timestamp, its level and its
/// source location.
#[derive(Debug)]
pub struct Logger {
    tz: Mutex<Option<TimeZone>>,
}

impl Logger {
    /// Create a new logger that logs to stderr and initialize it as the
    /// global logger. If there was a problem setting the logger, then an
    /// error is returned.
    pub fn init() -> Result<&'static Logger, log::SetLoggerError> {
        let logger = Box::leak(Box::new(Logger { tz: Mutex::new(None) }));
        log::set_logger(logger)?;
        Ok(logger)
    }

    /// Switch timestamps from UTC to the given time zone.
    pub fn set_time_zone(&self, tz: TimeZone) {
        if let Ok(mut logger_tz) = self.tz.lock() {
            *logger_tz = Some(tz);
        }
    }
}

impl Log for Logger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        // `Zoned::now()` would look up the system time zone, which logs,
        // which would recurse back into here.
        let ts = jiff::Timestamp::now();
        let tz = self.tz.lock().ok().and_then(|tz| tz.clone());
        let now = match tz {
            Some(tz) => ts.to_zoned(tz).to_string(),
            None => ts.to_string(),
        };
        match (record.file(), record.line()) {
            (Some(file), Some(line)) => {
                eprintln!(
                    "{}|{}|{}:{}: {}",
                    Theme::stderr().highlight(now),
                    record.level(),
                    relative(file),
                    line,
                    record.args()
                );
            }
            (Some(file), None) => {
                eprintln!(
                    "{}|{}|{}: {}",
                    Theme::stderr().highlight(now),
                    record.level(),
                    relative(file),
                    record.args()
                );
            }
            _ => {
                eprintln!(
                    "{}|{}: {}",
                    Theme::stderr().highlight(now),
                    record.level(),
                    record.args(),
                );
            }
        }
    }

    fn flush(&self) {
        // stderr is unbuffered
    }
}

fn relative<'p>(path: &'p str) -> &'p str {
    let Some(cwd) = cwd() else { return path };
    let Ok(relative) = Path::new(path).strip_prefix(cwd) else { return path };
    let Some(relative) = relative.to_str() else { return path };
    relative
}

fn cwd() -> Option<&'static Path> {
    static CWD: LazyLock<Option<PathBuf>> =
        LazyLock::new(|| std::env::current_dir().ok());
    CWD.as_deref()
}
