use std::fs::{File, Metadata};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Creates a watcher for the log file and returns a receiver for change events.
/// The watcher must be kept alive for events to be received.
///
/// The parent directory is watched rather than the file itself so that a log
/// which doesn't exist yet, or gets deleted and recreated, is still seen.
/// Events for other files in the directory are dropped.
pub fn watch_file(path: &Path) -> Result<(RecommendedWatcher, Receiver<()>)> {
    let (tx, rx) = mpsc::channel();

    let file_name = path.file_name().map(|f| f.to_os_string()).unwrap_or_default();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Access(_)) {
                return;
            }
            let ours = event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(file_name.as_os_str()));
            if ours {
                let _ = tx.send(());
            }
        }
    })
    .context("failed to create file watcher")?;

    let watch_path = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    watcher
        .watch(watch_path, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", watch_path.display()))?;

    Ok((watcher, rx))
}

/// Waits for a change event with timeout.
/// Returns true if an event was received, false on timeout.
pub fn wait_for_change(rx: &Receiver<()>, timeout: Duration) -> bool {
    rx.recv_timeout(timeout).is_ok()
}

/// Like [`wait_for_change`], but sleeps for the whole timeout when there is
/// no watcher to listen to.
pub fn wait_or_poll(rx: Option<&Receiver<()>>, timeout: Duration) -> bool {
    match rx {
        Some(rx) => wait_for_change(rx, timeout),
        None => {
            std::thread::sleep(timeout);
            false
        }
    }
}

/// Bytes from the start of the file kept to recognise a rewrite.
const HEAD_LEN: usize = 64;

#[cfg(unix)]
fn file_id(meta: &Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn file_id(_meta: &Metadata) -> Option<(u64, u64)> {
    None
}

fn read_head(f: &mut File, len: u64) -> std::io::Result<Vec<u8>> {
    f.seek(SeekFrom::Start(0))?;
    let mut head = Vec::new();
    f.take(len).read_to_end(&mut head)?;
    Ok(head)
}

/// Reads lines appended to a file since the last call.
///
/// A trailing line without its newline is held back until the rest arrives.
/// Reading restarts from the beginning when the file shrinks, is replaced by
/// another file, or its first bytes no longer match what was read before.
/// A rewrite that keeps the same first bytes and grows past the old offset
/// goes unnoticed.
pub struct Tail {
    path: PathBuf,
    offset: u64,
    partial: Vec<u8>,
    head: Vec<u8>,
    id: Option<(u64, u64)>,
}

impl Tail {
    /// Start from the beginning of the file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            partial: Vec::new(),
            head: Vec::new(),
            id: None,
        }
    }

    /// Start from the current end of the file (or 0 if it doesn't exist).
    pub fn at_end(path: impl Into<PathBuf>) -> Result<Self> {
        let mut tail = Self::new(path);
        let mut f = match File::open(&tail.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(tail),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to open {}", tail.path.display()))
            }
        };
        let meta = f
            .metadata()
            .with_context(|| format!("failed to stat {}", tail.path.display()))?;
        tail.offset = meta.len();
        tail.id = file_id(&meta);
        tail.head = read_head(&mut f, HEAD_LEN as u64)
            .with_context(|| format!("failed to read {}", tail.path.display()))?;
        Ok(tail)
    }

    fn restart(&mut self) {
        self.offset = 0;
        self.partial.clear();
        self.head.clear();
    }

    fn was_rewritten(&self, f: &mut File, meta: &Metadata) -> std::io::Result<bool> {
        if self.offset == 0 {
            return Ok(false);
        }
        if meta.len() < self.offset || file_id(meta) != self.id {
            return Ok(true);
        }
        Ok(read_head(f, self.head.len() as u64)? != self.head)
    }

    pub fn read_lines(&mut self) -> Result<Vec<String>> {
        let mut f = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to open {}", self.path.display()))
            }
        };
        let meta = f
            .metadata()
            .with_context(|| format!("failed to stat {}", self.path.display()))?;
        let rewritten = self
            .was_rewritten(&mut f, &meta)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        if rewritten {
            log::info!("{} was truncated or replaced, reading from the start", self.path.display());
            self.restart();
        }
        self.id = file_id(&meta);

        f.seek(SeekFrom::Start(self.offset))?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        self.offset += buf.len() as u64;
        if self.head.len() < HEAD_LEN {
            let want = (HEAD_LEN - self.head.len()).min(buf.len());
            self.head.extend_from_slice(&buf[..want]);
        }
        self.partial.extend_from_slice(&buf);

        let mut lines = Vec::new();
        while let Some(i) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=i).collect();
            let line = String::from_utf8_lossy(&line);
            lines.push(line.trim_end_matches(['\n', '\r']).to_string());
        }
        Ok(lines)
    }
}
