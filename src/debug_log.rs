//! Conditional debug log for the GTK backend.
//!
//! Nothing happens unless `GDK_DEBUG` was present in the environment the
//! first time the log is used. When it was, every call appends one record to
//! `/tmp/cmclient_gtk.log`:
//!
//! ```text
//! PreciseTime:1700000000,123456789. src/gtk/window.rs:42:on_size--->w=640
//! ```
//!
//! The file is opened and closed on each call. Writes are not serialized, so
//! records from concurrent threads may interleave. A failed open makes the
//! call return `false` and is otherwise ignored.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::paths;
use crate::record::{self, PreciseTime};

static GLOBAL: OnceLock<DebugLog> = OnceLock::new();

/// A log file gated by an environment variable.
///
/// The variable is checked once, on the first call to [`DebugLog::log`] or
/// [`DebugLog::is_enabled`], and the answer is kept for the life of the
/// value even if the environment changes afterwards.
#[derive(Debug)]
pub struct DebugLog {
    env_var: String,
    path: PathBuf,
    enabled: OnceLock<bool>,
}

impl DebugLog {
    pub fn new(env_var: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            env_var: env_var.into(),
            path: path.into(),
            enabled: OnceLock::new(),
        }
    }

    /// A log whose enablement is decided up front instead of by the
    /// environment. `env_var()` is empty for these.
    pub fn with_enabled(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            env_var: String::new(),
            path: path.into(),
            enabled: OnceLock::from(enabled),
        }
    }

    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Latches on first use. Only presence matters; an empty value enables.
    pub fn is_enabled(&self) -> bool {
        *self
            .enabled
            .get_or_init(|| std::env::var_os(&self.env_var).is_some())
    }

    /// Append one record. Returns `false` when disabled or when the file
    /// can't be opened.
    pub fn log(&self, args: fmt::Arguments<'_>, function: &str, line: u32, file: &str) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let now = PreciseTime::now();
        let Ok(mut f) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
        else {
            return false;
        };
        let _ = f.write_all(record::format_line(now, file, line, function, args).as_bytes());
        true
    }
}

/// The process-wide log: `GDK_DEBUG` gating `/tmp/cmclient_gtk.log`.
pub fn global() -> &'static DebugLog {
    GLOBAL.get_or_init(|| DebugLog::new(paths::ENV_VAR, paths::LOG_PATH))
}

/// Append a record to the process-wide log. Prefer [`gdk_debug_log!`],
/// which fills in the location for you.
///
/// [`gdk_debug_log!`]: crate::gdk_debug_log
pub fn log(args: fmt::Arguments<'_>, function: &str, line: u32, file: &str) -> bool {
    global().log(args, function, line, file)
}

/// Reduce a `type_name` path such as `crate::module::func::{{closure}}::f`
/// to `func`.
#[doc(hidden)]
pub fn bare_function_name(path: &'static str) -> &'static str {
    let path = path.strip_suffix("::f").unwrap_or(path);
    let path = path.trim_end_matches("::{{closure}}");
    match path.rfind("::") {
        Some(i) => &path[i + 2..],
        None => path,
    }
}

/// Name of the enclosing function.
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::debug_log::bare_function_name(type_name_of(f))
    }};
}

/// Log to the process-wide debug log with the caller's function, line and
/// file filled in. Takes `format!`-style arguments.
///
/// ```no_run
/// use gdk_debug_log::gdk_debug_log;
///
/// fn do_work(value: i32) {
///     gdk_debug_log!("value={}", value);
/// }
/// ```
///
/// `gdk_debug_log!(to: &log, ...)` writes to an explicit [`DebugLog`]
/// instead. Evaluates to `true` if a record was written.
#[macro_export]
macro_rules! gdk_debug_log {
    (to: $log:expr, $($arg:tt)+) => {
        ($log).log(
            ::std::format_args!($($arg)+),
            $crate::__function_name!(),
            ::std::line!(),
            ::std::file!(),
        )
    };
    ($($arg:tt)+) => {
        $crate::debug_log::log(
            ::std::format_args!($($arg)+),
            $crate::__function_name!(),
            ::std::line!(),
            ::std::file!(),
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{parse_log, Record};

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap_or_default()
    }

    #[test]
    fn accessors_report_construction() {
        let log = DebugLog::new("MY_GTK_DEBUG", "/var/tmp/gtk.log");
        assert_eq!(log.env_var(), "MY_GTK_DEBUG");
        assert_eq!(log.path(), Path::new("/var/tmp/gtk.log"));

        let forced = DebugLog::with_enabled("/var/tmp/gtk.log", true);
        assert_eq!(forced.env_var(), "");
        assert!(forced.is_enabled());

        assert_eq!(global().env_var(), "GDK_DEBUG");
        assert_eq!(global().path(), Path::new("/tmp/cmclient_gtk.log"));
    }

    #[test]
    fn disabled_log_never_touches_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtk.log");
        let log = DebugLog::with_enabled(&path, false);
        for i in 0..5 {
            assert!(!log.log(format_args!("n={i}"), "f", 1, "a.rs"));
        }
        assert!(!path.exists());
    }

    #[test]
    fn missing_env_var_disables() {
        let var = "GDK_DEBUG_LOG_TEST_MISSING";
        std::env::remove_var(var);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtk.log");
        let log = DebugLog::new(var, &path);
        assert!(!log.is_enabled());
        assert!(!log.log(format_args!("x"), "f", 1, "a.rs"));
        assert!(!path.exists());
    }

    #[test]
    fn enablement_latches_on_first_use() {
        let var = "GDK_DEBUG_LOG_TEST_LATCH";
        std::env::set_var(var, "");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtk.log");
        let log = DebugLog::new(var, &path);
        assert!(log.log(format_args!("first"), "f", 1, "a.rs"));

        std::env::remove_var(var);
        assert!(log.is_enabled());
        assert!(log.log(format_args!("second"), "f", 2, "a.rs"));
        assert_eq!(parse_log(&read(&path)).records.len(), 2);
    }

    #[test]
    fn disablement_latches_too() {
        let var = "GDK_DEBUG_LOG_TEST_LATCH_OFF";
        std::env::remove_var(var);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtk.log");
        let log = DebugLog::new(var, &path);
        assert!(!log.is_enabled());

        std::env::set_var(var, "1");
        assert!(!log.log(format_args!("late"), "f", 1, "a.rs"));
        std::env::remove_var(var);
        assert!(!path.exists());
    }

    #[test]
    fn writes_expected_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtk.log");
        let log = DebugLog::with_enabled(&path, true);

        assert!(log.log(format_args!("value={}", 7), "DoWork", 42, "worker.c"));

        let text = read(&path);
        let line = text.lines().next().unwrap();
        let rest = line.strip_prefix("PreciseTime:").unwrap();
        let (time, rest) = rest.split_once(". ").unwrap();
        let (secs, nanos) = time.split_once(',').unwrap();
        assert!(secs.parse::<i64>().is_ok());
        assert!(nanos.parse::<u32>().unwrap() < 1_000_000_000);
        assert_eq!(rest, "worker.c:42:DoWork--->value=7");
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn appends_without_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtk.log");
        std::fs::write(&path, "existing content\n").unwrap();
        let log = DebugLog::with_enabled(&path, true);

        let mut last_len = std::fs::metadata(&path).unwrap().len();
        for i in 0..10 {
            assert!(log.log(format_args!("call {i}"), "f", i, "a.rs"));
            let len = std::fs::metadata(&path).unwrap().len();
            assert!(len > last_len);
            last_len = len;
        }

        let text = read(&path);
        assert!(text.starts_with("existing content\n"));
        let parsed = parse_log(&text);
        assert_eq!(parsed.records.len(), 10);
        assert_eq!(parsed.skipped, 1);
        for (i, r) in parsed.records.iter().enumerate() {
            assert_eq!(r.message, format!("call {i}"));
        }
    }

    #[test]
    fn timestamps_do_not_go_backwards() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtk.log");
        let log = DebugLog::with_enabled(&path, true);
        for _ in 0..20 {
            log.log(format_args!("tick"), "f", 1, "a.rs");
        }
        let records = parse_log(&read(&path)).records;
        assert_eq!(records.len(), 20);
        for pair in records.windows(2) {
            assert!(pair[0].time <= pair[1].time);
        }
    }

    #[test]
    fn open_failure_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let log = DebugLog::with_enabled(dir.path().join("no/such/dir/gtk.log"), true);
        assert!(!log.log(format_args!("lost"), "f", 1, "a.rs"));

        // A directory can't be opened for appending either.
        let log = DebugLog::with_enabled(dir.path(), true);
        assert!(!log.log(format_args!("lost"), "f", 1, "a.rs"));
    }

    #[test]
    fn message_newline_is_not_doubled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtk.log");
        let log = DebugLog::with_enabled(&path, true);
        log.log(format_args!("with newline\n"), "f", 1, "a.rs");
        log.log(format_args!("without"), "f", 2, "a.rs");
        assert_eq!(read(&path).lines().count(), 2);
    }

    #[test]
    fn macro_fills_in_location() {
        fn do_work(log: &DebugLog) -> bool {
            gdk_debug_log!(to: log, "value={}", 7)
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtk.log");
        let log = DebugLog::with_enabled(&path, true);
        assert!(do_work(&log));

        let text = read(&path);
        let r = Record::parse(text.lines().next().unwrap()).unwrap();
        assert_eq!(r.function, "do_work");
        assert_eq!(r.file, file!());
        assert!(r.line > 0);
        assert_eq!(r.message, "value=7");
    }

    #[test]
    fn function_name_inside_closure() {
        fn outer() -> &'static str {
            let inner = || crate::__function_name!();
            inner()
        }
        assert_eq!(outer(), "outer");
    }

    #[test]
    fn bare_function_name_strips_path() {
        assert_eq!(bare_function_name("a::b::run::f"), "run");
        assert_eq!(bare_function_name("a::run::{{closure}}::{{closure}}::f"), "run");
        assert_eq!(bare_function_name("main::f"), "main");
        assert_eq!(bare_function_name("plain"), "plain");
    }

    #[test]
    fn concurrent_writers_each_land_a_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtk.log");
        let log = DebugLog::with_enabled(&path, true);
        std::thread::scope(|s| {
            for t in 0..4 {
                let log = &log;
                s.spawn(move || {
                    for i in 0..25 {
                        assert!(log.log(format_args!("t{t} i{i}"), "worker", 1, "a.rs"));
                    }
                });
            }
        });
        // Interleaving is allowed, but short appends from one write_all land
        // whole on local filesystems.
        assert_eq!(parse_log(&read(&path)).records.len(), 100);
    }
}
