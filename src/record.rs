//! The on-disk record format.
//!
//! One record per call:
//!
//! ```text
//! PreciseTime:<secs>,<nanos>. <file>:<line>:<function>---><message>
//! ```
//!
//! Messages may span several physical lines. Lines that do not start with
//! the `PreciseTime:` prefix continue the message of the record above them.
//! The format has no escaping, so a message line that itself starts with
//! `PreciseTime:` and looks like a header is read back as a record of its own.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use serde::Serialize;

const PREFIX: &str = "PreciseTime:";
const ARROW: &str = "--->";
const NANOS_PER_SEC: u32 = 1_000_000_000;

/// Wall-clock reading with nanosecond resolution, timespec style.
///
/// `nanos` is always in `0..1_000_000_000`; times before the epoch carry a
/// negative `secs` and a positive `nanos` offset from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PreciseTime {
    pub secs: i64,
    pub nanos: u32,
}

impl PreciseTime {
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    pub fn from_system_time(t: SystemTime) -> Self {
        match t.duration_since(UNIX_EPOCH) {
            Ok(d) => Self {
                secs: d.as_secs() as i64,
                nanos: d.subsec_nanos(),
            },
            Err(e) => {
                let d = e.duration();
                let mut secs = -(d.as_secs() as i64);
                let mut nanos = d.subsec_nanos();
                if nanos > 0 {
                    secs -= 1;
                    nanos = NANOS_PER_SEC - nanos;
                }
                Self { secs, nanos }
            }
        }
    }
}

impl fmt::Display for PreciseTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.secs, self.nanos)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub time: PreciseTime,
    pub file: String,
    pub line: u32,
    pub function: String,
    pub message: String,
}

/// A single physical line of the log, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    Record(Record),
    /// Text belonging to the previous record's message.
    Continuation(String),
    /// Starts like a record but could not be parsed.
    Malformed(String),
}

/// Render one record exactly as it is appended to the log.
/// A trailing newline is added unless the message already ends with one.
pub fn format_line(
    time: PreciseTime,
    file: &str,
    line: u32,
    function: &str,
    message: impl fmt::Display,
) -> String {
    let mut out = format!("{PREFIX}{time}. {file}:{line}:{function}{ARROW}{message}");
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

impl Record {
    /// Parse a record header line (without its continuation lines).
    pub fn parse(line: &str) -> Result<Record> {
        let line = line.trim_end_matches(['\n', '\r']);
        let Some(rest) = line.strip_prefix(PREFIX) else {
            bail!("missing {PREFIX} prefix");
        };
        let (time, rest) = rest
            .split_once(". ")
            .context("missing '. ' after timestamp")?;
        let (secs, nanos) = time
            .split_once(',')
            .context("timestamp must be <secs>,<nanos>")?;
        let secs: i64 = secs
            .parse()
            .with_context(|| format!("invalid seconds '{secs}'"))?;
        let nanos: u32 = nanos
            .parse()
            .with_context(|| format!("invalid nanoseconds '{nanos}'"))?;
        if nanos >= NANOS_PER_SEC {
            bail!("nanoseconds out of range: {nanos}");
        }

        let (location, message) = rest.split_once(ARROW).context("missing '--->'")?;
        // The file name may contain ':' (e.g. `C:\src\x.cpp`), so peel the
        // function and line off the right.
        let (location, function) = location
            .rsplit_once(':')
            .context("missing function name")?;
        let (file, line_num) = location.rsplit_once(':').context("missing line number")?;
        let line_num: u32 = line_num
            .parse()
            .with_context(|| format!("invalid line number '{line_num}'"))?;

        Ok(Record {
            time: PreciseTime { secs, nanos },
            file: file.to_string(),
            line: line_num,
            function: function.to_string(),
            message: message.to_string(),
        })
    }

    /// The record as it appears in the log, newline included.
    pub fn to_line(&self) -> String {
        format_line(self.time, &self.file, self.line, &self.function, &self.message)
    }
}

pub fn classify_line(line: &str) -> LogLine {
    if !line.starts_with(PREFIX) {
        return LogLine::Continuation(line.trim_end_matches(['\n', '\r']).to_string());
    }
    match Record::parse(line) {
        Ok(r) => LogLine::Record(r),
        Err(e) => {
            log::debug!("unparsable record line: {e:#}");
            LogLine::Malformed(line.trim_end_matches(['\n', '\r']).to_string())
        }
    }
}

#[derive(Debug, Default)]
pub struct ParsedLog {
    pub records: Vec<Record>,
    /// Malformed headers plus continuation lines with no record above them.
    pub skipped: usize,
}

/// Parse a whole log, folding continuation lines into their record.
pub fn parse_log(text: &str) -> ParsedLog {
    let mut parsed = ParsedLog::default();
    for line in text.lines() {
        match classify_line(line) {
            LogLine::Record(r) => parsed.records.push(r),
            LogLine::Continuation(text) => match parsed.records.last_mut() {
                Some(last) => {
                    last.message.push('\n');
                    last.message.push_str(&text);
                }
                None => parsed.skipped += 1,
            },
            LogLine::Malformed(_) => parsed.skipped += 1,
        }
    }
    parsed
}
