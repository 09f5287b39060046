//! Document conversion: pandoc wrapper plus front-matter/body splitting.
//!
//! Conversion itself is delegated to an external program behind the
//! [`Converter`] trait. What comes back is post-processed here:
//!
//! 1. pandoc's escapes for `[`, `]` and `!` are undone so authors can embed
//!    raw Markdown in their documents;
//! 2. leading `key: value` lines are lifted into front matter, using an
//!    allow-list so that a first paragraph which merely contains a colon is
//!    left alone;
//! 3. the configured base URL is stripped from body lines, turning absolute
//!    links back into site-relative ones.
//!
//! ## Front-matter state machine
//!
//! ```text
//!            blank line: count it, stay
//!            ┌─────┐
//!            ▼     │
//!   ┌──────────────────┐  key line   ┌──────────────────┐
//!   │ parsing metadata │ ──────────▶ │ record key/value │──┐
//!   └──────────────────┘ ◀────────── └──────────────────┘  │
//!            │ any other line                               │
//!            ▼                                              │
//!   ┌──────────────────┐                                    │
//!   │       body       │ ◀── every later line, verbatim ────┘
//!   └──────────────────┘
//! ```
//!
//! A *key line* contains `:`, the text before the first `:` has no space,
//! and that key is in the allow-list (or the allow-list is empty).

use crate::cache::{self, FileAction};
use crate::front_matter::{self, FrontMatter};
use std::path::Path;
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{program} failed on {path}: {stderr}")]
    Failed {
        program: String,
        path: String,
        stderr: String,
    },
    #[error("{0} produced non-UTF-8 output")]
    Encoding(String),
}

/// Front-matter keys recognised when no list is configured.
pub const DEFAULT_FRONT_MATTER_FIELDS: &[&str] = &["title", "lastUpdated"];

/// Extensions handed to the document converter.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["docx", "doc"];

/// pandoc escapes that are reverted after conversion.
const UNESCAPES: &[(&str, &str)] = &[("\\[", "["), ("\\]", "]"), ("\\!", "!")];

/// Turns a document on disk into Markdown-ish text.
pub trait Converter {
    fn convert(&self, path: &Path) -> Result<String, ConvertError>;
}

/// `pandoc --wrap=none -s <file> -t <dialect> -o -`
#[derive(Debug, Clone)]
pub struct Pandoc {
    program: String,
    dialect: String,
}

impl Default for Pandoc {
    fn default() -> Self {
        Self {
            program: "pandoc".to_string(),
            dialect: "gfm".to_string(),
        }
    }
}

impl Pandoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = dialect.into();
        self
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--wrap=none")
            .arg("-s")
            .arg(path)
            .arg("-t")
            .arg(&self.dialect)
            .arg("-o")
            .arg("-");
        cmd
    }
}

impl Converter for Pandoc {
    fn convert(&self, path: &Path) -> Result<String, ConvertError> {
        tracing::info!(program = %self.program, dialect = %self.dialect, path = %path.display(), "converting document");
        let output = self.command(path).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(path = %path.display(), %stderr, "document conversion failed");
            return Err(ConvertError::Failed {
                program: self.program.clone(),
                path: path.display().to_string(),
                stderr,
            });
        }
        String::from_utf8(output.stdout).map_err(|_| ConvertError::Encoding(self.program.clone()))
    }
}

/// Body text plus whatever metadata was lifted from its head.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertedDocument {
    pub body: String,
    pub front_matter: FrontMatter,
}

impl ConvertedDocument {
    /// Final file contents: front matter (with defaults merged) then body.
    pub fn render<'a>(&self, defaults: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
        self.front_matter.clone().with_defaults(defaults).document(&self.body)
    }
}

pub fn unescape_markdown(line: &str) -> String {
    UNESCAPES
        .iter()
        .fold(line.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Match a candidate metadata line against the allow-list.
///
/// Returns the canonical key (as spelled in the allow-list) and the trimmed
/// value. Keys compare case-insensitively.
fn key_line<'a>(line: &'a str, allow_list: &[String]) -> Option<(String, &'a str)> {
    let (key, value) = line.split_once(':')?;
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    if allow_list.is_empty() {
        return Some((key.to_string(), value.trim()));
    }
    allow_list
        .iter()
        .find(|allowed| allowed.eq_ignore_ascii_case(key))
        .map(|allowed| (allowed.clone(), value.trim()))
}

/// Split converter output into front matter and body.
pub fn split_front_matter(text: &str, allow_list: &[String], base_url: &str) -> ConvertedDocument {
    let mut front_matter = FrontMatter::new();
    let mut body = String::new();
    let mut parsing_front_matter = true;
    let mut blank_lines = 0usize;

    for raw in text.lines() {
        let line = unescape_markdown(raw);
        if parsing_front_matter {
            if line.trim().is_empty() {
                blank_lines += 1;
                continue;
            }
            if let Some((key, value)) = key_line(&line, allow_list) {
                front_matter.insert(key, value);
                continue;
            }
            parsing_front_matter = false;
        }
        if base_url.is_empty() {
            body.push_str(&line);
        } else {
            body.push_str(&line.replace(base_url, ""));
        }
        body.push('\n');
    }

    tracing::debug!(keys = front_matter.len(), blank_lines, "split front matter");
    ConvertedDocument { body, front_matter }
}

/// Lift the first `# ` heading into `title` when none was found.
pub fn promote_heading_title(doc: &mut ConvertedDocument) {
    if doc.front_matter.contains_key("title") {
        return;
    }
    let mut body = String::with_capacity(doc.body.len());
    let mut promoted = false;
    for line in doc.body.lines() {
        if !promoted && let Some(heading) = line.strip_prefix("# ") {
            doc.front_matter.insert("title", heading.trim());
            promoted = true;
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }
    if promoted {
        doc.body = body;
    }
}

/// Collapse runs of blank lines and strip trailing whitespace.
pub fn normalise_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_blank = true;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if !previous_blank {
                out.push('\n');
            }
            previous_blank = true;
        } else {
            out.push_str(line);
            out.push('\n');
            previous_blank = false;
        }
    }
    out.trim_end().to_string()
}

/// Options for turning one document into a Markdown file.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    pub allow_list: Vec<String>,
    pub base_url: String,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            allow_list: DEFAULT_FRONT_MATTER_FIELDS.iter().map(|s| s.to_string()).collect(),
            base_url: String::new(),
        }
    }
}

/// Run the converter and apply the full post-processing chain.
pub fn document_to_markdown(
    converter: &dyn Converter,
    path: &Path,
    options: &DocumentOptions,
) -> Result<ConvertedDocument, ConvertError> {
    let raw = converter.convert(path)?;
    let mut doc = split_front_matter(&raw, &options.allow_list, &options.base_url);
    promote_heading_title(&mut doc);
    doc.body = normalise_markdown(&doc.body);
    Ok(doc)
}

pub fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| DOCUMENT_EXTENSIONS.iter().any(|d| d.eq_ignore_ascii_case(e)))
}

/// Convert `source` into the Markdown file `target` unless the target
/// already carries the source's modification time.
pub fn convert_if_changed(
    converter: &dyn Converter,
    source: &Path,
    target: &Path,
    options: &DocumentOptions,
) -> Result<FileAction, ConvertError> {
    if cache::is_up_to_date(source, target) {
        return Ok(FileAction::UpToDate);
    }
    let doc = document_to_markdown(converter, source, options)?;
    cache::write_output(target, doc.render(front_matter::DEFAULT_FIELDS.iter().copied()))?;
    cache::copy_mtime(source, target)?;
    Ok(FileAction::Converted)
}

/// Canned-output converter for tests.
#[cfg(test)]
pub struct FakeConverter {
    pub output: String,
    pub fail: bool,
    pub calls: std::cell::RefCell<Vec<std::path::PathBuf>>,
}

#[cfg(test)]
impl FakeConverter {
    pub fn new(output: &str) -> Self {
        Self {
            output: output.to_string(),
            fail: false,
            calls: std::cell::RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

#[cfg(test)]
impl Converter for FakeConverter {
    fn convert(&self, path: &Path) -> Result<String, ConvertError> {
        self.calls.borrow_mut().push(path.to_path_buf());
        if self.fail {
            return Err(ConvertError::Failed {
                program: "fake".into(),
                path: path.display().to_string(),
                stderr: "boom".into(),
            });
        }
        Ok(self.output.clone())
    }
}
