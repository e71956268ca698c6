//! Per-endpoint daily log files.
//!
//! Records land in `<LOG_PATH>/http-logger<sanitized-path>-<date>.log`,
//! where the sanitized path has every `/` replaced by `-`. Files are opened
//! create-or-append and never truncated. Every failure is reported through
//! the injected logger and swallowed; the HTTP response must never depend
//! on the outcome of a log write.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use crate::logger::HostLogger;

/// Directory the log files are created under. Resolved on every write, so
/// operators can repoint it without restarting the host. Empty or unset
/// means the current directory.
pub const LOG_PATH_ENV: &str = "LOG_PATH";

const FILE_PREFIX: &str = "http-logger";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// One lock per target file, held across open-write-close so concurrent
/// requests to the same endpoint never interleave records.
static FILE_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    let locks = FILE_LOCKS.get_or_init(Mutex::default);
    let mut map = locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    map.entry(path.to_path_buf()).or_default().clone()
}

pub(crate) fn log_file_name(request_path: &str, date: NaiveDate) -> String {
    format!(
        "{FILE_PREFIX}{}-{}.log",
        request_path.replace('/', "-"),
        date.format(DATE_FORMAT)
    )
}

/// Appends one record for `request_path`, creating the log directory and
/// file as needed.
pub(crate) fn write_record(request_path: &str, record: &str, date: NaiveDate, logger: &dyn HostLogger) {
    let dir = PathBuf::from(crate::env::string_or(LOG_PATH_ENV, ""));
    if !dir.as_os_str().is_empty() {
        if let Err(err) = fs::create_dir_all(&dir) {
            logger.error(&format!(
                "failed to create log directory {}: {err}",
                dir.display()
            ));
        }
    }
    append_record(&dir.join(log_file_name(request_path, date)), record, logger);
}

fn append_record(path: &Path, record: &str, logger: &dyn HostLogger) {
    let lock = lock_for(path);
    let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(mut file) => {
            if let Err(err) = writeln!(file, "{record}") {
                logger.error(&format!(
                    "could not write to log file {}: {err}",
                    path.display()
                ));
            }
        }
        Err(err) => logger.error(&format!("failed to open log file {}: {err}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::NoopLogger;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    #[test]
    fn file_name_replaces_path_separators() {
        assert_eq!(log_file_name("/orders", day()), "http-logger-orders-2026-08-06.log");
        assert_eq!(
            log_file_name("/api/v1/users", day()),
            "http-logger-api-v1-users-2026-08-06.log"
        );
    }

    #[test]
    fn file_name_for_root_path() {
        assert_eq!(log_file_name("/", day()), "http-logger--2026-08-06.log");
    }

    #[test]
    fn append_creates_then_appends_without_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.log");

        append_record(&path, "first", &NoopLogger);
        append_record(&path, "second", &NoopLogger);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn open_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the target path makes the open fail.
        let path = dir.path().join("taken");
        fs::create_dir(&path).unwrap();

        append_record(&path, "record", &NoopLogger);
    }

    #[test]
    fn concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = Arc::new(dir.path().join("concurrent.log"));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let record = format!("record-{i}-{}", "x".repeat(4096));
                    append_record(&path, &record, &NoopLogger);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = fs::read_to_string(path.as_path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 8);
        for line in lines {
            assert!(line.starts_with("record-"));
            assert_eq!(line.len(), "record-0-".len() + 4096);
        }
    }
}
