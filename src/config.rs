//! Run configuration.
//!
//! Settings come from three layers, lowest first:
//!
//! 1. built-in defaults
//! 2. a configuration file (`--config`, or a `config.*` file at the root of
//!    the scanned input tree)
//! 3. the command line
//!
//! A value set on a higher layer is never overwritten by a lower one.
//!
//! ## File formats
//!
//! YAML and TOML files are a mapping of the keys below. Unknown keys are
//! rejected to catch typos early.
//!
//! ```yaml
//! input: ./content
//! output: ./site
//! generator: eleventy      # hugo (default) | eleventy
//! width: 9                 # slideshow block ratio
//! height: 16
//! processVideo: true
//! gridWidth: 12
//! widthPolicy: uniform     # uniform | sized
//! emptyRows: emit          # emit | skip
//! baseURL: https://intranet.example.com
//! validFrontMatterFields: [title, lastUpdated]
//! operations:
//!   - operation: convertToMarkdown
//!     inputFiles: '^handbook/(.*)\.docx$'
//!     outputFiles: 'pages/$1.md'
//!   - operation: copyFolder
//!     source: assets
//!     destination: static/assets
//! ```
//!
//! Spreadsheets (`.csv`, `.xls`, `.xlsx`) carry the same keys one per row:
//! the key in the first column, the value in the second. List keys take
//! every further non-empty cell, and operation rows take their arguments
//! positionally:
//!
//! ```text
//! input,./content
//! validFrontMatterFields,title,lastUpdated,owner
//! convertToMarkdown,^handbook/(.*)\.docx$,pages/$1.md
//! ```
//!
//! Rows whose key is not recognised (a header row, notes) are skipped.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::convert::{DEFAULT_FRONT_MATTER_FIELDS, DocumentOptions};
use crate::packer::{DEFAULT_GRID_WIDTH, EmptyRowPolicy, MAX_GRID_WIDTH, WidthPolicy};
use crate::scan::{CONFIG_BASENAME, CONFIG_EXTENSIONS};
use crate::tabular::{self, TabularError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config spreadsheet error: {0}")]
    Tabular(#[from] TabularError),
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),
    #[error("Unsupported config file: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Static site generator the dashboard rows are written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generator {
    #[default]
    Hugo,
    Eleventy,
}

impl FromStr for Generator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hugo" => Ok(Generator::Hugo),
            "eleventy" | "11ty" => Ok(Generator::Eleventy),
            other => Err(format!("unknown generator '{other}' (expected hugo|eleventy)")),
        }
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Generator::Hugo => "hugo",
            Generator::Eleventy => "eleventy",
        })
    }
}

/// A configured step of the `docs` entry point.
///
/// Patterns are regular expressions matched against input-relative paths
/// written with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Operation {
    /// Convert every matching document; the output path is the match with
    /// `output_files` substituted (`$1` style group references).
    ConvertToMarkdown {
        input_files: String,
        output_files: String,
    },
    /// Concatenate every matching document or spreadsheet into one file.
    #[serde(alias = "filesToMarkdown")]
    ConcatToMarkdown {
        input_files: String,
        output_file: String,
    },
    /// Concatenate every matching spreadsheet into one CSV.
    #[serde(rename = "filesToCSV", alias = "filesToCsv")]
    FilesToCsv {
        input_files: String,
        output_file: String,
    },
    /// Write a CSV listing the files of every matching folder.
    ListFiles {
        input_folder: String,
        output_file: String,
    },
    /// Mirror a folder, copying only files whose mtime differs.
    CopyFolder { source: String, destination: String },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ConvertToMarkdown { .. } => "convertToMarkdown",
            Operation::ConcatToMarkdown { .. } => "concatToMarkdown",
            Operation::FilesToCsv { .. } => "filesToCSV",
            Operation::ListFiles { .. } => "listFiles",
            Operation::CopyFolder { .. } => "copyFolder",
        }
    }

    /// The regular expression this operation selects paths with, if any.
    pub fn pattern(&self) -> Option<&str> {
        match self {
            Operation::ConvertToMarkdown { input_files, .. }
            | Operation::ConcatToMarkdown { input_files, .. }
            | Operation::FilesToCsv { input_files, .. } => Some(input_files),
            Operation::ListFiles { input_folder, .. } => Some(input_folder),
            Operation::CopyFolder { .. } => None,
        }
    }

    /// Canonical tag and positional field names for a spreadsheet row.
    fn positional_fields(key: &str) -> Option<(&'static str, [&'static str; 2])> {
        let fields = match key.to_lowercase().as_str() {
            "converttomarkdown" => ("convertToMarkdown", ["inputFiles", "outputFiles"]),
            "concattomarkdown" | "filestomarkdown" => ("concatToMarkdown", ["inputFiles", "outputFile"]),
            "filestocsv" => ("filesToCSV", ["inputFiles", "outputFile"]),
            "listfiles" => ("listFiles", ["inputFolder", "outputFile"]),
            "copyfolder" => ("copyFolder", ["source", "destination"]),
            _ => return None,
        };
        Some(fields)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ConvertToMarkdown { input_files, output_files } => {
                write!(f, "{} {input_files} -> {output_files}", self.name())
            }
            Operation::ConcatToMarkdown { input_files, output_file }
            | Operation::FilesToCsv { input_files, output_file } => {
                write!(f, "{} {input_files} -> {output_file}", self.name())
            }
            Operation::ListFiles { input_folder, output_file } => {
                write!(f, "{} {input_folder} -> {output_file}", self.name())
            }
            Operation::CopyFolder { source, destination } => {
                write!(f, "{} {source} -> {destination}", self.name())
            }
        }
    }
}

/// One configuration layer. Every field is optional; layering decides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ConfigFile {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    /// Folder `listFiles` results are written under (defaults to `output`).
    pub data: Option<PathBuf>,
    /// Folder copied into `output` before a `docs` run.
    pub template: Option<PathBuf>,
    pub generator: Option<Generator>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub process_video: Option<bool>,
    pub grid_width: Option<u32>,
    pub width_policy: Option<WidthPolicy>,
    pub empty_rows: Option<EmptyRowPolicy>,
    #[serde(rename = "baseURL", alias = "baseUrl")]
    pub base_url: Option<String>,
    pub valid_front_matter_fields: Option<Vec<String>>,
    pub markdown_dialect: Option<String>,
    pub operations: Vec<Operation>,
}

/// Scalar keys accepted in spreadsheet configs, in canonical spelling.
const SCALAR_KEYS: &[&str] = &[
    "input",
    "output",
    "data",
    "template",
    "generator",
    "width",
    "height",
    "processVideo",
    "gridWidth",
    "widthPolicy",
    "emptyRows",
    "baseURL",
    "markdownDialect",
];

/// Keys whose value is every remaining cell of the row.
const LIST_KEYS: &[&str] = &["validFrontMatterFields"];

fn canonical_key<'a>(keys: &[&'a str], key: &str) -> Option<&'a str> {
    keys.iter().copied().find(|k| k.eq_ignore_ascii_case(key))
}

impl ConfigFile {
    /// Load a configuration layer, picking the parser by file extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let config = match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml(&fs::read_to_string(path)?)?,
            "toml" => Self::from_toml(&fs::read_to_string(path)?)?,
            "csv" | "xls" | "xlsx" => Self::from_rows(&tabular::read_rows(path)?)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        tracing::debug!(path = %path.display(), "loaded config layer");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Build a layer from spreadsheet rows.
    ///
    /// Rows are turned into the same mapping a YAML file would hold, so
    /// key names and value types are checked by one deserializer.
    pub fn from_rows(rows: &[Vec<String>]) -> Result<Self, ConfigError> {
        let mut mapping = serde_yaml::Mapping::new();
        let mut operations = Vec::new();

        for row in rows {
            let Some(key) = row.first().map(|k| k.trim()) else {
                continue;
            };
            let values: Vec<&str> = row[1..]
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .collect();
            if key.is_empty() || key.starts_with('#') {
                continue;
            }

            if let Some(canonical) = canonical_key(SCALAR_KEYS, key) {
                let Some(value) = values.first() else {
                    continue;
                };
                mapping.insert(canonical.into(), scalar_value(canonical, value));
            } else if let Some(canonical) = canonical_key(LIST_KEYS, key) {
                let list = values.iter().map(|v| serde_yaml::Value::from(*v)).collect();
                mapping.insert(canonical.into(), serde_yaml::Value::Sequence(list));
            } else if let Some((tag, fields)) = Operation::positional_fields(key) {
                if values.len() < fields.len() {
                    return Err(ConfigError::Validation(format!(
                        "{tag} needs {} arguments ({}), got {}",
                        fields.len(),
                        fields.join(", "),
                        values.len()
                    )));
                }
                let mut op = serde_yaml::Mapping::new();
                op.insert("operation".into(), tag.into());
                for (field, value) in fields.iter().zip(&values) {
                    op.insert((*field).into(), (*value).into());
                }
                operations.push(serde_yaml::Value::Mapping(op));
            } else {
                tracing::warn!(key, "ignoring unrecognised config row");
            }
        }

        if !operations.is_empty() {
            mapping.insert("operations".into(), serde_yaml::Value::Sequence(operations));
        }
        Ok(serde_yaml::from_value(serde_yaml::Value::Mapping(mapping))?)
    }

    /// Fill every unset field of `self` from `lower`.
    ///
    /// Operations are taken as a whole: a layer that configures any
    /// operations replaces the lower layer's list.
    pub fn layered_over(self, lower: ConfigFile) -> ConfigFile {
        ConfigFile {
            input: self.input.or(lower.input),
            output: self.output.or(lower.output),
            data: self.data.or(lower.data),
            template: self.template.or(lower.template),
            generator: self.generator.or(lower.generator),
            width: self.width.or(lower.width),
            height: self.height.or(lower.height),
            process_video: self.process_video.or(lower.process_video),
            grid_width: self.grid_width.or(lower.grid_width),
            width_policy: self.width_policy.or(lower.width_policy),
            empty_rows: self.empty_rows.or(lower.empty_rows),
            base_url: self.base_url.or(lower.base_url),
            valid_front_matter_fields: self
                .valid_front_matter_fields
                .or(lower.valid_front_matter_fields),
            markdown_dialect: self.markdown_dialect.or(lower.markdown_dialect),
            operations: if self.operations.is_empty() {
                lower.operations
            } else {
                self.operations
            },
        }
    }
}

/// Typed value for a spreadsheet cell. Unparseable numbers stay strings
/// so the deserializer reports them against the key.
fn scalar_value(key: &str, cell: &str) -> serde_yaml::Value {
    match key {
        "width" | "height" | "gridWidth" => match cell.parse::<u64>() {
            Ok(n) => n.into(),
            Err(_) => cell.into(),
        },
        "processVideo" => match cell.to_lowercase().as_str() {
            "true" | "yes" | "1" => true.into(),
            "false" | "no" | "0" => false.into(),
            _ => cell.into(),
        },
        _ => cell.into(),
    }
}

/// Locate a `config.*` file at the root of an input tree.
pub fn find_tree_config(input: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let mut found: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(input)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let stem_matches = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.eq_ignore_ascii_case(CONFIG_BASENAME));
        let ext_matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| CONFIG_EXTENSIONS.iter().any(|c| c.eq_ignore_ascii_case(e)));
        if stem_matches && ext_matches {
            found.push(path);
        }
    }
    found.sort();
    Ok(found.into_iter().next())
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub data: PathBuf,
    pub template: Option<PathBuf>,
    pub generator: Generator,
    /// Slideshow block ratio, width:height.
    pub block: (u32, u32),
    pub process_video: bool,
    pub grid_width: u32,
    pub width_policy: WidthPolicy,
    pub empty_rows: EmptyRowPolicy,
    pub base_url: String,
    pub front_matter_fields: Vec<String>,
    pub markdown_dialect: String,
    pub operations: Vec<Operation>,
}

pub const DEFAULT_BLOCK: (u32, u32) = (9, 16);
pub const DEFAULT_DIALECT: &str = "gfm";

impl Settings {
    /// Apply built-in defaults to the merged layers and validate.
    pub fn resolve(config: ConfigFile) -> Result<Self, ConfigError> {
        let input = config.input.ok_or(ConfigError::MissingArgument("input"))?;
        let output = config.output.ok_or(ConfigError::MissingArgument("output"))?;
        let settings = Settings {
            data: config.data.unwrap_or_else(|| output.clone()),
            input,
            output,
            template: config.template,
            generator: config.generator.unwrap_or_default(),
            block: (
                config.width.unwrap_or(DEFAULT_BLOCK.0),
                config.height.unwrap_or(DEFAULT_BLOCK.1),
            ),
            process_video: config.process_video.unwrap_or(true),
            grid_width: config.grid_width.unwrap_or(DEFAULT_GRID_WIDTH),
            width_policy: config.width_policy.unwrap_or_default(),
            empty_rows: config.empty_rows.unwrap_or_default(),
            base_url: config.base_url.unwrap_or_default(),
            front_matter_fields: config.valid_front_matter_fields.unwrap_or_else(|| {
                DEFAULT_FRONT_MATTER_FIELDS.iter().map(|s| s.to_string()).collect()
            }),
            markdown_dialect: config
                .markdown_dialect
                .unwrap_or_else(|| DEFAULT_DIALECT.to_string()),
            operations: config.operations,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block.0 == 0 || self.block.1 == 0 {
            return Err(ConfigError::Validation(
                "width and height must be non-zero".into(),
            ));
        }
        if self.grid_width == 0 || self.grid_width > MAX_GRID_WIDTH {
            return Err(ConfigError::Validation(format!(
                "gridWidth must be between 1 and {MAX_GRID_WIDTH}"
            )));
        }
        for op in &self.operations {
            if let Some(pattern) = op.pattern() {
                regex::Regex::new(pattern).map_err(|e| {
                    ConfigError::Validation(format!("{}: invalid pattern: {e}", op.name()))
                })?;
            }
        }
        Ok(())
    }

    pub fn document_options(&self) -> DocumentOptions {
        DocumentOptions {
            allow_list: self.front_matter_fields.clone(),
            base_url: self.base_url.clone(),
        }
    }
}
