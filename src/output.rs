//! CLI output formatting for every command.
//!
//! Output is information-first: each row or slide leads with its positional
//! index and title, with file names as secondary, indented context.
//!
//! ## Dashboard
//!
//! ```text
//! 001 Services → Row001.md
//!     col 1 (3) link: Mail → /icons/1-1-icon.svg
//!     col 4 (3) image
//!     col 7 (6) blank
//! ```
//!
//! ## Slideshow
//!
//! ```text
//! 001 Welcome.png → 1-1700000000.svg
//! 002 Intro.mp4 → 2-1700000000.mp4
//! ```
//!
//! ## Docs / FAQ
//!
//! ```text
//! Guides/Setup.docx → Guides/Setup.md (converted)
//! broken.docx: failed (pandoc exited with status 1)
//! ```
//!
//! Each `format_*` function returns `Vec<String>` and does no I/O; the
//! `print_*` wrappers write the lines to stdout.

use crate::cache::{FileAction, FileEvent, RunReport};
use crate::dashboard::DashboardReport;
use crate::packer::{ColumnDescriptor, RowRecord};
use crate::slideshow::SlideshowReport;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn action_label(action: &FileAction) -> &'static str {
    match action {
        FileAction::Converted => "converted",
        FileAction::Copied => "copied",
        FileAction::UpToDate => "up to date",
        FileAction::Failed(_) => "failed",
    }
}

// ============================================================================
// Dashboard
// ============================================================================

fn row_header(record: &RowRecord, file: &str) -> String {
    match &record.title {
        Some(title) if !title.is_empty() => {
            format!("{} {} → {}", format_index(record.number), title, file)
        }
        _ => format!("{} ({})", format_index(record.number), file),
    }
}

fn column_line(column: &ColumnDescriptor) -> String {
    let mut line = format!("{}col {} ({}) {}", indent(1), column.column, column.width, column.kind);
    if let Some(label) = column.label.as_deref().filter(|l| !l.is_empty()) {
        line.push_str(&format!(": {label}"));
    }
    if let Some(icon) = &column.icon {
        line.push_str(&format!(" → {icon}"));
    }
    line
}

pub fn format_dashboard_output(result: &DashboardReport) -> Vec<String> {
    let mut lines = Vec::new();
    for row in &result.rows {
        lines.push(row_header(&row.record, &row.file));
        lines.extend(row.record.columns.iter().map(column_line));
    }
    lines.extend(format_failures(&result.report));
    lines.push(format!(
        "Wrote {} rows ({})",
        result.rows.len(),
        result.report.stats
    ));
    lines
}

pub fn print_dashboard_output(result: &DashboardReport) {
    print_lines(format_dashboard_output(result));
}

// ============================================================================
// Slideshow
// ============================================================================

pub fn format_slideshow_output(result: &SlideshowReport) -> Vec<String> {
    let mut lines: Vec<String> = result
        .slides
        .iter()
        .map(|slide| {
            format!(
                "{} {} → {}",
                format_index(slide.index),
                slide.source.display(),
                slide.file
            )
        })
        .collect();
    lines.extend(format_failures(&result.report));
    lines.push(format!(
        "Wrote {} slides at {} ({})",
        result.slides.len(),
        result.timestamp,
        result.report.stats
    ));
    lines
}

pub fn print_slideshow_output(result: &SlideshowReport) {
    print_lines(format_slideshow_output(result));
}

// ============================================================================
// Docs and FAQ
// ============================================================================

pub fn format_event(event: &FileEvent) -> String {
    match (&event.action, &event.output) {
        (FileAction::Failed(reason), _) => {
            format!("{}: failed ({reason})", event.source.display())
        }
        (action, Some(output)) => format!(
            "{} → {} ({})",
            event.source.display(),
            output.display(),
            action_label(action)
        ),
        (action, None) => format!("{} ({})", event.source.display(), action_label(action)),
    }
}

/// Failure lines only; the per-command formatters list successes themselves.
fn format_failures(report: &RunReport) -> Vec<String> {
    report.failures().map(format_event).collect()
}

pub fn format_run_report(report: &RunReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .events
        .iter()
        .filter(|e| e.action != FileAction::UpToDate)
        .map(format_event)
        .collect();
    lines.push(report.stats.to_string());
    lines
}

pub fn print_run_report(report: &RunReport) {
    print_lines(format_run_report(report));
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
