mod cli;

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};

use cli::{Cli, Command};
use gdk_debug_log::config::Config;
use gdk_debug_log::debug_log::DebugLog;
use gdk_debug_log::locale::LocaleIdent;
use gdk_debug_log::output::{self, LocaleDetail, Status};
use gdk_debug_log::paths;
use gdk_debug_log::record::{self, LogLine, Record};
use gdk_debug_log::watch::{self, Tail};

fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .init();
}

fn read_log(path: &Path) -> Result<String> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

fn load_records(path: &Path, tail: Option<usize>) -> Result<Vec<Record>> {
    let parsed = record::parse_log(&read_log(path)?);
    if parsed.skipped > 0 {
        warn!("skipped {} unparsable line(s) in {}", parsed.skipped, path.display());
    }
    let mut records = parsed.records;
    if let Some(n) = tail {
        let start = records.len().saturating_sub(n);
        records.drain(..start);
    }
    Ok(records)
}

fn status(config: &Config, log_path: &Path) -> Status {
    let meta = std::fs::metadata(log_path).ok();
    Status {
        path: log_path.display().to_string(),
        env_var: config.env_var().to_string(),
        env_set: std::env::var_os(config.env_var()).is_some(),
        exists: meta.is_some(),
        size: meta.map(|m| m.len()),
    }
}

/// Write one record. Returns whether it landed; failure is not an error.
fn emit(
    config: &Config,
    log_path: &Path,
    message: &str,
    function: &str,
    line: u32,
    file: &str,
    force: bool,
) -> bool {
    let log = if force {
        DebugLog::with_enabled(log_path, true)
    } else {
        DebugLog::new(config.env_var(), log_path)
    };
    let written = log.log(format_args!("{message}"), function, line, file);
    if !written {
        if log.is_enabled() {
            warn!("could not open {}", log.path().display());
        } else {
            info!("{} is not set; nothing written", config.env_var());
        }
    }
    written
}

fn print_line(out: &mut impl Write, line: &str, json: bool) -> Result<()> {
    match record::classify_line(line) {
        LogLine::Record(r) => {
            if json {
                writeln!(out, "{}", serde_json::to_string(&r)?)?;
            } else {
                write!(out, "{}", output::format_record(&r))?;
            }
        }
        LogLine::Continuation(text) => {
            if json {
                writeln!(out, "{}", serde_json::json!({ "continuation": text }))?;
            } else {
                writeln!(out, "    {text}")?;
            }
        }
        LogLine::Malformed(text) => warn!("unparsable line: {text}"),
    }
    Ok(())
}

/// Print lines as they are appended until `running` is cleared. Without a
/// watcher the file is polled every `poll`.
fn follow(
    log_path: &Path,
    poll: Duration,
    json: bool,
    from_start: bool,
    running: &AtomicBool,
    out: &mut impl Write,
) -> Result<()> {
    let watcher = match watch::watch_file(log_path) {
        Ok(w) => Some(w),
        Err(e) => {
            warn!("{e:#}; polling every {}ms instead", poll.as_millis());
            None
        }
    };
    let rx = watcher.as_ref().map(|(_, rx)| rx);
    let mut tail = if from_start {
        Tail::new(log_path)
    } else {
        Tail::at_end(log_path)?
    };
    info!("following {} (poll {}ms)", log_path.display(), poll.as_millis());
    loop {
        // Sampled before reading so a final append is still printed.
        let keep_going = running.load(Ordering::SeqCst);
        for line in tail.read_lines()? {
            print_line(out, &line, json)?;
        }
        out.flush()?;
        if !keep_going {
            return Ok(());
        }
        watch::wait_or_poll(rx, poll);
    }
}

fn locale(input: &str, posix: bool, json: bool) -> Result<()> {
    let ident = if posix {
        LocaleIdent::from_posix(input)
    } else {
        LocaleIdent::from_tag(input)
    };
    if ident.is_empty() {
        warn!("'{input}' is not a recognised locale");
    }
    let detail = LocaleDetail::new(&ident);
    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        print!("{}", output::format_locale_detail(&detail));
    }
    Ok(())
}

fn dispatch(command: Command, config: &Config, log_path: &Path) -> Result<()> {
    match command {
        Command::Emit {
            message,
            function,
            line,
            file,
            force,
        } => {
            emit(config, log_path, &message, &function, line, &file, force);
        }
        Command::Status { json } => {
            let status = status(config, log_path);
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print!("{}", output::format_status(&status));
            }
        }
        Command::Show { json, tail } => {
            let records = load_records(log_path, tail)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print!("{}", output::format_record_list(&records));
            }
        }
        Command::Follow { json, from_start } => {
            let running = Arc::new(AtomicBool::new(true));
            let r = running.clone();
            ctrlc::set_handler(move || {
                r.store(false, Ordering::SeqCst);
            })
            .context("failed to set signal handler")?;
            follow(
                log_path,
                config.poll_interval(),
                json,
                from_start,
                &running,
                &mut std::io::stdout().lock(),
            )?;
        }
        Command::Locale { input, posix, json } => locale(&input, posix, json)?,
    }
    Ok(())
}

fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    let config_path = paths::config_path(cli.config.as_deref());
    let config = Config::load_from(&config_path)?;
    let log_path = paths::log_path(cli.path.as_deref(), config.log.path.as_deref());
    debug!(
        "config {}, log {}",
        config_path.display(),
        log_path.display()
    );

    dispatch(cli.command, &config, &log_path)
}
