//! Document tree conversion.
//!
//! Mirrors an input tree into an output tree. Configured [`Operation`]s
//! run first, in order, and claim the files they consume; every file left
//! unclaimed then gets the default behaviour:
//!
//! - `.docx` / `.doc` become a Markdown file at the same relative path
//!   (front matter + body)
//! - anything else is copied
//!
//! Both default paths skip files whose output already carries the source's
//! modification time, and stamp that time on the output afterwards.
//!
//! A failing file is logged and counted; the rest of the tree is still
//! processed.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::cache::{self, FileAction, RunReport};
use crate::config::{Operation, Settings};
use crate::convert::{self, ConvertError, Converter, DocumentOptions};
use crate::front_matter::{self, FrontMatter};
use crate::scan;
use crate::tabular::{self, Table, TabularError};

#[derive(Error, Debug)]
pub enum DocsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input folder not found: {0}")]
    MissingInput(PathBuf),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),
    #[error("Spreadsheet error: {0}")]
    Tabular(#[from] TabularError),
}

/// Column header of `listFiles` output.
pub const LIST_FILES_HEADER: &str = "Filename";

#[derive(Debug, Clone)]
pub struct DocsOptions {
    pub output: PathBuf,
    /// Root for `listFiles` output.
    pub data: PathBuf,
    pub template: Option<PathBuf>,
    pub document: DocumentOptions,
    pub operations: Vec<Operation>,
}

impl DocsOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        let output = output.into();
        Self {
            data: output.clone(),
            output,
            template: None,
            document: DocumentOptions::default(),
            operations: Vec::new(),
        }
    }
}

impl From<&Settings> for DocsOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            output: settings.output.clone(),
            data: settings.data.clone(),
            template: settings.template.clone(),
            document: settings.document_options(),
            operations: settings.operations.clone(),
        }
    }
}

/// Input-relative path with `/` separators, the form operation patterns
/// are matched against.
fn slash_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Every file under `input`, keyed by its slash path. Unreadable
/// sub-folders are recorded as failures in `report` and skipped.
fn list_input(input: &Path, report: &mut RunReport) -> Result<BTreeMap<String, PathBuf>, DocsError> {
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(input).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let folder = scan::skip_unreadable(input, e)?;
                report.record(slash_path(&folder.relative), None, FileAction::Failed(folder.error));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(input).unwrap_or(entry.path());
        files.insert(slash_path(relative), entry.path().to_path_buf());
    }
    Ok(files)
}

/// One run over an input tree.
struct DocsRun<'a> {
    input: &'a Path,
    options: &'a DocsOptions,
    converter: &'a dyn Converter,
    files: BTreeMap<String, PathBuf>,
    pending: BTreeSet<String>,
    report: RunReport,
}

/// Convert the tree at `input` as configured by `options`.
pub fn convert_tree(
    input: &Path,
    options: &DocsOptions,
    converter: &dyn Converter,
) -> Result<RunReport, DocsError> {
    if !input.is_dir() {
        return Err(DocsError::MissingInput(input.to_path_buf()));
    }
    fs::create_dir_all(&options.output)?;

    let mut report = RunReport::default();
    let files = list_input(input, &mut report)?;
    let mut run = DocsRun {
        input,
        options,
        converter,
        pending: files.keys().cloned().collect(),
        files,
        report,
    };

    if let Some(template) = &options.template {
        tracing::info!(template = %template.display(), "copying template");
        cache::copy_folder(template, &options.output, &mut run.report)?;
    }

    for operation in &options.operations {
        tracing::info!(%operation, "running operation");
        if let Err(e) = run.apply(operation) {
            tracing::error!(%operation, error = %e, "operation failed");
            run.report
                .record(operation.name(), None, FileAction::Failed(e.to_string()));
        }
    }

    run.apply_defaults();
    Ok(run.report)
}

impl DocsRun<'_> {
    fn apply(&mut self, operation: &Operation) -> Result<(), DocsError> {
        match operation {
            Operation::ConvertToMarkdown {
                input_files,
                output_files,
            } => self.convert_to_markdown(&Regex::new(input_files)?, output_files),
            Operation::ConcatToMarkdown {
                input_files,
                output_file,
            } => self.concat_to_markdown(&Regex::new(input_files)?, output_file),
            Operation::FilesToCsv {
                input_files,
                output_file,
            } => self.files_to_csv(&Regex::new(input_files)?, output_file),
            Operation::ListFiles {
                input_folder,
                output_file,
            } => self.list_files(&Regex::new(input_folder)?, output_file),
            Operation::CopyFolder {
                source,
                destination,
            } => self.copy_folder(source, destination),
        }
    }

    /// Unclaimed files matching `pattern`, in path order.
    fn matching(&self, pattern: &Regex) -> Vec<String> {
        self.pending
            .iter()
            .filter(|path| pattern.is_match(path))
            .cloned()
            .collect()
    }

    fn source(&self, relative: &str) -> PathBuf {
        self.files
            .get(relative)
            .cloned()
            .unwrap_or_else(|| self.input.join(relative))
    }

    fn claim(&mut self, relative: &str) {
        self.pending.remove(relative);
    }

    fn convert_to_markdown(&mut self, pattern: &Regex, output_files: &str) -> Result<(), DocsError> {
        for relative in self.matching(pattern) {
            let target_relative = pattern.replace(&relative, output_files).into_owned();
            let target = self.options.output.join(&target_relative);
            let source = self.source(&relative);
            let action = if tabular::is_tabular(&source) {
                spreadsheet_to_markdown(&source, &target)
            } else {
                convert::convert_if_changed(self.converter, &source, &target, &self.options.document)
                    .map_err(DocsError::from)
            };
            self.finish(&relative, target, action);
            self.claim(&relative);
        }
        Ok(())
    }

    fn concat_to_markdown(&mut self, pattern: &Regex, output_file: &str) -> Result<(), DocsError> {
        let target = self.options.output.join(output_file);
        let mut merged = FrontMatter::new();
        let mut parts = Vec::new();

        for relative in self.matching(pattern) {
            let source = self.source(&relative);
            let part = if tabular::is_tabular(&source) {
                tabular::read_table(&source)
                    .map(|table| table.to_markdown())
                    .map_err(DocsError::from)
            } else if convert::is_document(&source) {
                convert::document_to_markdown(self.converter, &source, &self.options.document)
                    .map(|doc| {
                        for (key, value) in doc.front_matter.iter() {
                            merged.insert(key, value);
                        }
                        doc.body
                    })
                    .map_err(DocsError::from)
            } else {
                continue;
            };
            match part {
                Ok(text) => {
                    parts.push(text);
                    self.report
                        .record(relative.as_str(), Some(target.clone()), FileAction::Converted);
                }
                Err(e) => self.fail(&relative, e),
            }
            self.claim(&relative);
        }

        let body = convert::normalise_markdown(&parts.join("\n\n"));
        let document = merged
            .with_defaults(front_matter::DEFAULT_FIELDS.iter().copied())
            .document(&body);
        cache::write_output(&target, document)?;
        Ok(())
    }

    fn files_to_csv(&mut self, pattern: &Regex, output_file: &str) -> Result<(), DocsError> {
        let target = self.options.output.join(output_file);
        let mut combined = Table::default();

        for relative in self.matching(pattern) {
            let source = self.source(&relative);
            if !tabular::is_tabular(&source) {
                continue;
            }
            match tabular::read_table(&source) {
                Ok(table) => {
                    combined.append(&table);
                    self.report
                        .record(relative.as_str(), Some(target.clone()), FileAction::Converted);
                }
                Err(e) => self.fail(&relative, e.into()),
            }
            self.claim(&relative);
        }

        combined.write_csv(&target)?;
        Ok(())
    }

    /// One CSV per matching folder listing the names of its files.
    fn list_files(&self, pattern: &Regex, output_file: &str) -> Result<(), DocsError> {
        let mut folders: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for relative in self.files.keys() {
            let (folder, name) = relative.rsplit_once('/').unwrap_or(("", relative.as_str()));
            folders.entry(folder.to_string()).or_default().push(name.to_string());
        }

        for (folder, names) in folders.iter().filter(|(folder, _)| pattern.is_match(folder)) {
            let target_relative = pattern.replace(folder, output_file).into_owned();
            let target = self.options.data.join(&target_relative);
            let mut table = Table::new(vec![LIST_FILES_HEADER.to_string()]);
            table.rows = names.iter().map(|n| vec![n.clone()]).collect();
            table.write_csv(&target)?;
            tracing::debug!(folder = %folder, target = %target.display(), files = names.len(), "listed files");
        }
        Ok(())
    }

    fn copy_folder(&mut self, source: &str, destination: &str) -> Result<(), DocsError> {
        let from = self.input.join(source);
        let visited = cache::copy_folder(&from, &self.options.output.join(destination), &mut self.report)?;
        for path in visited {
            if let Ok(relative) = path.strip_prefix(self.input) {
                let key = slash_path(relative);
                self.claim(&key);
            }
        }
        Ok(())
    }

    /// Documents become Markdown, everything else is copied.
    fn apply_defaults(&mut self) {
        let pending: Vec<String> = std::mem::take(&mut self.pending).into_iter().collect();
        for relative in pending {
            let source = self.source(&relative);
            if convert::is_document(&source) {
                let target = self.options.output.join(Path::new(&relative).with_extension("md"));
                let action =
                    convert::convert_if_changed(self.converter, &source, &target, &self.options.document)
                        .map_err(DocsError::from);
                self.finish(&relative, target, action);
            } else {
                let target = self.options.output.join(&relative);
                let action = cache::copy_if_changed(&source, &target)
                    .map(FileAction::from)
                    .map_err(DocsError::from);
                self.finish(&relative, target, action);
            }
        }
    }

    fn finish(&mut self, relative: &str, target: PathBuf, action: Result<FileAction, DocsError>) {
        match action {
            Ok(action) => self.report.record(relative, Some(target), action),
            Err(e) => self.fail(relative, e),
        }
    }

    fn fail(&mut self, relative: &str, error: DocsError) {
        tracing::error!(file = relative, %error, "failed");
        self.report
            .record(relative, None, FileAction::Failed(error.to_string()));
    }
}

/// Render a spreadsheet as a Markdown table document.
fn spreadsheet_to_markdown(source: &Path, target: &Path) -> Result<FileAction, DocsError> {
    if cache::is_up_to_date(source, target) {
        return Ok(FileAction::UpToDate);
    }
    let table = tabular::read_table(source)?;
    let document = FrontMatter::new()
        .with_defaults(front_matter::DEFAULT_FIELDS.iter().copied())
        .document(&table.to_markdown());
    cache::write_output(target, document)?;
    cache::copy_mtime(source, target)?;
    Ok(FileAction::Converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::FakeConverter;
    use crate::test_helpers::create_text_file;
    use tempfile::TempDir;

    struct Tree {
        _tmp: TempDir,
        input: PathBuf,
        output: PathBuf,
    }

    fn tree(files: &[(&str, &str)]) -> Tree {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        fs::create_dir_all(&input).unwrap();
        for (name, contents) in files {
            create_text_file(&input.join(name), contents);
        }
        Tree {
            _tmp: tmp,
            input,
            output,
        }
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    // =========================================================================
    // Default behaviour
    // =========================================================================

    #[test]
    fn documents_convert_and_others_copy() {
        let t = tree(&[("guide/Intro.docx", "docx"), ("guide/logo.png", "png")]);
        let converter = FakeConverter::new("# Introduction\n\nWelcome.\n");

        let report = convert_tree(&t.input, &DocsOptions::new(&t.output), &converter).unwrap();

        assert_eq!(
            read(&t.output.join("guide/Intro.md")),
            "---\ntitle: Introduction\nlayout: default\n---\nWelcome.\n"
        );
        assert_eq!(read(&t.output.join("guide/logo.png")), "png");
        assert_eq!(report.stats.converted, 1);
        assert_eq!(report.stats.copied, 1);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_sub_folder_fails_alone() {
        let t = tree(&[("locked/a.txt", "a"), ("open/b.txt", "b")]);
        let locked = t.input.join("locked");
        if !crate::test_helpers::make_unreadable(&locked) {
            return;
        }

        let report = convert_tree(&t.input, &DocsOptions::new(&t.output), &FakeConverter::new(""));
        crate::test_helpers::make_readable(&locked);

        let report = report.unwrap();
        assert_eq!(read(&t.output.join("open/b.txt")), "b");
        let failed: Vec<&Path> = report.failures().map(|e| e.source.as_path()).collect();
        assert_eq!(failed, vec![Path::new("locked")]);
        assert_eq!(report.stats.copied, 1);
    }

    #[test]
    fn second_run_is_up_to_date() {
        let t = tree(&[("a.docx", "docx"), ("b.txt", "text")]);
        let converter = FakeConverter::new("Body\n");
        let options = DocsOptions::new(&t.output);

        convert_tree(&t.input, &options, &converter).unwrap();
        let again = convert_tree(&t.input, &options, &converter).unwrap();

        assert_eq!(again.stats.up_to_date, 2);
        assert_eq!(again.stats.converted + again.stats.copied, 0);
        assert_eq!(converter.call_count(), 1);
    }

    #[test]
    fn failed_document_does_not_stop_the_run() {
        let t = tree(&[("a.docx", "docx"), ("b.txt", "text")]);
        let report = convert_tree(&t.input, &DocsOptions::new(&t.output), &FakeConverter::failing()).unwrap();

        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.copied, 1);
        assert!(!t.output.join("a.md").exists());
    }

    #[test]
    fn missing_input_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let result = convert_tree(
            &tmp.path().join("nope"),
            &DocsOptions::new(tmp.path().join("out")),
            &FakeConverter::new(""),
        );
        assert!(matches!(result, Err(DocsError::MissingInput(_))));
    }

    // =========================================================================
    // Operations
    // =========================================================================

    #[test]
    fn convert_to_markdown_renames_outputs() {
        let t = tree(&[("handbook/01 Leave.docx", "docx"), ("handbook/notes.txt", "n")]);
        let options = DocsOptions {
            operations: vec![Operation::ConvertToMarkdown {
                input_files: r"^handbook/\d+ (.*)\.docx$".into(),
                output_files: "pages/$1.md".into(),
            }],
            ..DocsOptions::new(&t.output)
        };

        convert_tree(&t.input, &options, &FakeConverter::new("Text\n")).unwrap();

        assert!(t.output.join("pages/Leave.md").exists());
        assert!(!t.output.join("handbook/01 Leave.md").exists());
        assert!(t.output.join("handbook/notes.txt").exists());
    }

    #[test]
    fn concat_merges_documents_and_tables() {
        let t = tree(&[
            ("policy/1 Part.docx", "docx"),
            ("policy/2 Rates.csv", "Band,Rate\nA,10\n"),
        ]);
        let options = DocsOptions {
            operations: vec![Operation::ConcatToMarkdown {
                input_files: "^policy/".into(),
                output_file: "policy.md".into(),
            }],
            ..DocsOptions::new(&t.output)
        };

        let report = convert_tree(&t.input, &options, &FakeConverter::new("title: Policy\n\nIntro.\n")).unwrap();

        assert_eq!(
            read(&t.output.join("policy.md")),
            "---\ntitle: Policy\nlayout: default\n---\nIntro.\n\n| Band | Rate |\n| --- | --- |\n| A | 10 |\n"
        );
        assert_eq!(report.stats.converted, 2);
        assert!(!t.output.join("policy").exists());
    }

    #[test]
    fn files_to_csv_unions_columns() {
        let t = tree(&[("data/a.csv", "Name,Team\nAda,Core\n"), ("data/b.csv", "Name,Room\nBob,4\n")]);
        let options = DocsOptions {
            operations: vec![Operation::FilesToCsv {
                input_files: r"^data/.*\.csv$".into(),
                output_file: "people.csv".into(),
            }],
            ..DocsOptions::new(&t.output)
        };

        convert_tree(&t.input, &options, &FakeConverter::new("")).unwrap();

        assert_eq!(
            read(&t.output.join("people.csv")),
            "Name,Team,Room\nAda,Core,\nBob,,4\n"
        );
        assert!(!t.output.join("data/a.csv").exists());
    }

    #[test]
    fn list_files_writes_under_data_folder() {
        let t = tree(&[("downloads/forms/b.pdf", "b"), ("downloads/forms/a.pdf", "a")]);
        let data = t.output.join("_data");
        let options = DocsOptions {
            data: data.clone(),
            operations: vec![Operation::ListFiles {
                input_folder: "^downloads/(.*)$".into(),
                output_file: "$1.csv".into(),
            }],
            ..DocsOptions::new(&t.output)
        };

        convert_tree(&t.input, &options, &FakeConverter::new("")).unwrap();

        assert_eq!(read(&data.join("forms.csv")), "Filename\na.pdf\nb.pdf\n");
        // Listing does not claim the files.
        assert!(t.output.join("downloads/forms/a.pdf").exists());
    }

    #[test]
    fn copy_folder_claims_its_files() {
        let t = tree(&[("assets/img/logo.docx", "not really a document")]);
        let options = DocsOptions {
            operations: vec![Operation::CopyFolder {
                source: "assets".into(),
                destination: "static".into(),
            }],
            ..DocsOptions::new(&t.output)
        };
        let converter = FakeConverter::new("");

        convert_tree(&t.input, &options, &converter).unwrap();

        assert_eq!(read(&t.output.join("static/img/logo.docx")), "not really a document");
        assert_eq!(converter.call_count(), 0);
        assert!(!t.output.join("assets").exists());
    }

    #[test]
    fn template_is_copied_first() {
        let t = tree(&[("index.txt", "from input")]);
        let template = t.input.parent().unwrap().join("template");
        create_text_file(&template.join("layouts/default.html"), "<html/>");
        let options = DocsOptions {
            template: Some(template),
            ..DocsOptions::new(&t.output)
        };

        convert_tree(&t.input, &options, &FakeConverter::new("")).unwrap();

        assert_eq!(read(&t.output.join("layouts/default.html")), "<html/>");
        assert_eq!(read(&t.output.join("index.txt")), "from input");
    }

    #[test]
    fn slash_paths_ignore_platform_separator() {
        let path: PathBuf = ["a", "b", "c.docx"].iter().collect();
        assert_eq!(slash_path(&path), "a/b/c.docx");
    }
}
