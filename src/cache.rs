//! Modification-time idempotence for incremental runs.
//!
//! Every output this crate derives from a single source file (converted
//! Markdown, copied assets, transcoded video) is stamped with the source's
//! modification time once written. On the next run an output whose mtime
//! equals its source's is considered current and the work is skipped.
//!
//! The check is keyed purely on mtime equality, not content: touching a
//! source forces reprocessing, and replacing an output by hand (which gives
//! it a fresh mtime) makes it stale again.
//!
//! Concurrent runs against the same output tree are not coordinated.

use std::fmt;
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

pub fn modified(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// True when `output` exists and carries exactly `input`'s mtime.
pub fn is_up_to_date(input: &Path, output: &Path) -> bool {
    match (modified(input), modified(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Stamp `output` with `input`'s modification time.
pub fn copy_mtime(input: &Path, output: &Path) -> io::Result<()> {
    let mtime = modified(input)?;
    let file = File::options().write(true).open(output)?;
    file.set_times(FileTimes::new().set_modified(mtime))
}

/// Write `contents` to `output`, creating parent folders.
pub fn write_output(output: &Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, contents)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    UpToDate,
}

/// Copy `input` to `output` unless the output is already current.
pub fn copy_if_changed(input: &Path, output: &Path) -> io::Result<CopyOutcome> {
    if is_up_to_date(input, output) {
        return Ok(CopyOutcome::UpToDate);
    }
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(input, output)?;
    copy_mtime(input, output)?;
    Ok(CopyOutcome::Copied)
}

/// Copy a folder tree, skipping files that are already current.
///
/// Returns every source file visited so callers can mark them handled.
/// Files already present in `destination` but absent from `source` are
/// left alone.
pub fn copy_folder(source: &Path, destination: &Path, report: &mut RunReport) -> io::Result<Vec<PathBuf>> {
    let mut visited = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let target = destination.join(relative);
        let outcome = copy_if_changed(entry.path(), &target)?;
        report.record(entry.path(), Some(target), outcome.into());
        visited.push(entry.path().to_path_buf());
    }
    Ok(visited)
}

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    Converted,
    Copied,
    UpToDate,
    Failed(String),
}

impl From<CopyOutcome> for FileAction {
    fn from(outcome: CopyOutcome) -> Self {
        match outcome {
            CopyOutcome::Copied => FileAction::Copied,
            CopyOutcome::UpToDate => FileAction::UpToDate,
        }
    }
}

/// One line of a run log. Paths are relative to the input and output roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub source: PathBuf,
    pub output: Option<PathBuf>,
    pub action: FileAction,
}

/// Ordered log of a run plus its counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub events: Vec<FileEvent>,
    pub stats: RunStats,
}

impl RunReport {
    pub fn record(&mut self, source: impl Into<PathBuf>, output: Option<PathBuf>, action: FileAction) {
        self.stats.count(&action);
        self.events.push(FileEvent {
            source: source.into(),
            output,
            action,
        });
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e.action, FileAction::Failed(_)))
    }
}

/// Per-run counters, printed as the final summary line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub converted: u32,
    pub copied: u32,
    pub up_to_date: u32,
    pub failed: u32,
}

impl RunStats {
    pub fn total(&self) -> u32 {
        self.converted + self.copied + self.up_to_date + self.failed
    }

    pub fn count(&mut self, action: &FileAction) {
        match action {
            FileAction::Converted => self.converted += 1,
            FileAction::Copied => self.copied += 1,
            FileAction::UpToDate => self.up_to_date += 1,
            FileAction::Failed(_) => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: RunStats) {
        self.converted += other.converted;
        self.copied += other.copied;
        self.up_to_date += other.up_to_date;
        self.failed += other.failed;
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Converted {}, copied {}, up to date {}, failed {}",
            self.converted, self.copied, self.up_to_date, self.failed
        )
    }
}
