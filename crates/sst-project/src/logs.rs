use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

/// A `*.log` tab in the project's log directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified_at: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPage {
    /// Newest first.
    pub lines: Vec<String>,
    pub total: usize,
    pub has_more: bool,
}

impl LogPage {
    fn empty() -> Self {
        Self {
            lines: Vec::new(),
            total: 0,
            has_more: false,
        }
    }
}

/// Index range on a sequence of `total` lines, counted back from the end.
///
/// `offset` lines are skipped from the newest end, then up to `limit` lines
/// are taken. Parameters past either end clamp to an empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogWindow {
    pub start: usize,
    pub end: usize,
}

impl LogWindow {
    pub fn new(total: usize, offset: usize, limit: usize) -> Self {
        let end = total.saturating_sub(offset);
        let start = end.saturating_sub(limit);
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Older lines exist before this window.
    pub fn has_more(&self) -> bool {
        self.start > 0
    }
}

/// Non-blank lines of `path` in file order. A missing file reads as empty.
pub fn read_log_lines(path: &Path) -> io::Result<Vec<String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "log file missing");
            return Ok(Vec::new());
        }
        Err(err) => return Err(err),
    };

    Ok(String::from_utf8_lossy(&bytes)
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

/// Last `count` non-blank lines, oldest first.
pub fn tail_lines(path: &Path, count: usize) -> io::Result<Vec<String>> {
    let mut lines = read_log_lines(path)?;
    let keep_from = lines.len().saturating_sub(count);
    Ok(lines.split_off(keep_from))
}

/// One page of `path`, newest first. `offset` counts lines already seen from
/// the newest end.
pub fn page(path: &Path, offset: usize, limit: usize) -> io::Result<LogPage> {
    let lines = read_log_lines(path)?;
    if lines.is_empty() {
        return Ok(LogPage::empty());
    }

    let total = lines.len();
    let window = LogWindow::new(total, offset, limit);
    let mut selected = lines[window.start..window.end].to_vec();
    selected.reverse();

    Ok(LogPage {
        lines: selected,
        total,
        has_more: window.has_more(),
    })
}

/// Every `*.log` file under `log_dir`, most recently modified first.
pub fn list_log_files(log_dir: &Path) -> io::Result<Vec<LogFile>> {
    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("log") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        files.push(LogFile {
            name: name.to_string(),
            size: metadata.len(),
            modified_at: metadata.modified()?,
            path,
        });
    }

    files.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
    Ok(files)
}
