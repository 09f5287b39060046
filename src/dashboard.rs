//! Dashboard generation: one Markdown file per grid row.
//!
//! Each section of the input tree is packed into rows by [`GridPacker`];
//! every closed row is written as `Row{NNN}.md` holding only a front-matter
//! block that a static site template turns into a row of tiles.
//!
//! ```text
//! output/
//! ├── Row001.md
//! ├── Row002.md
//! └── static/
//!     ├── icons/1-1-icon.svg     # link icon for row 1, column 1
//!     └── images/1-2.svg         # padded image for row 1, column 2
//! ```
//!
//! Sections with no items (a folder holding only subfolders) follow the
//! packer's [`EmptyRowPolicy`]; the untitled root section is skipped when
//! empty.
//!
//! A column whose asset cannot be materialised (unreadable shortcut,
//! undecodable icon) is written as `blank`, and the run continues.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cache::{self, FileAction, RunReport};
use crate::classify::{self, Classification, ItemKind};
use crate::config::{Generator, Settings};
use crate::front_matter::FrontMatter;
use crate::imaging::{self, Background, BackendError, ImageBackend};
use crate::naming::pad_int;
use crate::packer::{Cell, EmptyRowPolicy, GridPacker, PackError, RowRecord, WidthPolicy};
use crate::scan::{self, ScanError};
use crate::types::{Item, Section};

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Layout error: {0}")]
    Pack(#[from] PackError),
    #[error("Image error: {0}")]
    Image(#[from] BackendError),
    #[error("Item has no usable file: {0}")]
    MissingAsset(String),
}

pub const ICONS_DIR: &str = "static/icons";
pub const IMAGES_DIR: &str = "static/images";

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub generator: Generator,
    pub grid_width: u32,
    pub width_policy: WidthPolicy,
    pub empty_rows: EmptyRowPolicy,
    pub background: Background,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            generator: Generator::default(),
            grid_width: crate::packer::DEFAULT_GRID_WIDTH,
            width_policy: WidthPolicy::default(),
            empty_rows: EmptyRowPolicy::default(),
            background: Background::white(),
        }
    }
}

impl From<&Settings> for DashboardOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            generator: settings.generator,
            grid_width: settings.grid_width,
            width_policy: settings.width_policy,
            empty_rows: settings.empty_rows,
            background: Background::white(),
        }
    }
}

/// A row as written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenRow {
    pub record: RowRecord,
    /// File name relative to the output folder.
    pub file: String,
}

#[derive(Debug, Default)]
pub struct DashboardReport {
    pub rows: Vec<WrittenRow>,
    pub report: RunReport,
}

pub fn row_file_name(number: usize) -> String {
    format!("Row{}.md", pad_int(number, 3))
}

fn icon_file_name(row: usize, column: u32) -> String {
    format!("{row}-{column}-icon.svg")
}

fn image_file_name(row: usize, column: u32) -> String {
    format!("{row}-{column}.svg")
}

/// Site-relative URL of a file under `static/`.
fn site_url(dir: &str, file_name: &str) -> String {
    let served = dir.strip_prefix("static/").unwrap_or(dir);
    format!("/{served}/{file_name}")
}

/// Front matter for one closed row.
///
/// ```text
/// ---
/// title: Services
/// col1Width: 1
/// col1Type: link
/// col1URL: https://status.example.com
/// col1Label: Status
/// col1Icon: /icons/1-1-icon.svg
/// col2Width: 11
/// col2Type: blank
/// ---
/// ```
pub fn row_front_matter(record: &RowRecord, generator: Generator) -> FrontMatter {
    let mut fm = FrontMatter::new();
    if let Some(title) = &record.title {
        fm.insert("title", title.as_str());
    }
    if generator == Generator::Eleventy {
        fm.insert("tags", "row");
        fm.insert("height", record.height.to_string());
    }
    for col in &record.columns {
        let key = |suffix: &str| format!("col{}{suffix}", col.column);
        fm.insert(key("Width"), col.width.to_string());
        fm.insert(key("Type"), col.kind.as_str());
        if col.kind == ItemKind::Blank {
            continue;
        }
        if let Some(url) = &col.url {
            fm.insert(key("URL"), url.as_str());
        }
        if let Some(label) = &col.label {
            fm.insert(key("Label"), label.as_str());
        }
        if let Some(icon) = &col.icon {
            fm.insert(key("Icon"), icon.as_str());
        }
    }
    fm
}

/// Generate the dashboard for `input` into `output`.
pub fn generate(
    input: &Path,
    output: &Path,
    options: &DashboardOptions,
    backend: &impl ImageBackend,
) -> Result<DashboardReport, DashboardError> {
    let scan = scan::scan_sections(input)?;
    for source in &scan.config_sources {
        tracing::debug!(config = %source.display(), "config pseudo-item extracted");
    }
    fs::create_dir_all(output)?;

    let ctx = CellContext {
        output,
        options,
        backend,
    };
    let mut packer = GridPacker::new(options.grid_width)?.with_empty_rows(options.empty_rows);
    let mut result = DashboardReport::default();
    for folder in &scan.skipped {
        result
            .report
            .record(&folder.relative, None, FileAction::Failed(folder.error.clone()));
    }

    // An empty titled folder still reaches the packer so the empty-row
    // policy decides whether it becomes a spacer row.
    for section in scan.sections.iter().filter(|s| !s.items.is_empty() || s.title().is_some()) {
        packer.begin_section(section.title());
        for item in &section.items {
            let cell = ctx.build_cell(section, item, &packer, &mut result.report);
            if let Some(record) = packer.add(cell)? {
                write_row(output, record, options.generator, &mut result)?;
            }
        }
        if let Some(record) = packer.flush() {
            write_row(output, record, options.generator, &mut result)?;
        }
    }

    Ok(result)
}

fn write_row(
    output: &Path,
    record: RowRecord,
    generator: Generator,
    result: &mut DashboardReport,
) -> Result<(), DashboardError> {
    let file = row_file_name(record.number);
    let contents = row_front_matter(&record, generator).to_yaml_block();
    cache::write_output(&output.join(&file), contents)?;
    tracing::debug!(%record, file = %file, "wrote row");
    result.rows.push(WrittenRow { record, file });
    Ok(())
}

/// Presentation data of a materialised column.
struct Placed {
    url: String,
    icon: Option<String>,
    written: Option<PathBuf>,
}

struct CellContext<'a, B> {
    output: &'a Path,
    options: &'a DashboardOptions,
    backend: &'a B,
}

impl<B: ImageBackend> CellContext<'_, B> {
    /// Classify an item and materialise its assets, degrading to a blank
    /// cell when that fails.
    fn build_cell(&self, section: &Section, item: &Item, packer: &GridPacker, report: &mut RunReport) -> Cell {
        let class = classify::classify(item);
        let width = self.options.width_policy.width_for(class.kind);
        let height = self.options.width_policy.height_for(class.kind);
        let (row, column) = packer.next_position(width);
        let source = section.relative.join(&item.basename);

        let placed = match class.kind {
            ItemKind::Blank => return Cell { height, ..Cell::blank(width) },
            ItemKind::Iframe => shortcut_url(section, item, class.url_extension).map(|url| Placed {
                url,
                icon: None,
                written: None,
            }),
            ItemKind::Link => self.place_link(section, item, &class, (row, column)),
            ItemKind::Image => self.place_image(section, item, &class, (row, column), (width, height)),
        };

        match placed {
            Ok(placed) => {
                if let Some(written) = placed.written {
                    report.record(&source, Some(written), FileAction::Converted);
                }
                Cell {
                    kind: class.kind,
                    label: Some(class.label),
                    url: Some(placed.url),
                    icon: placed.icon,
                    width,
                    height,
                }
            }
            Err(e) => {
                tracing::warn!(
                    item = %section.path.join(&item.basename).display(),
                    kind = %class.kind,
                    error = %e,
                    "degrading column to blank"
                );
                report.record(&source, None, FileAction::Failed(e.to_string()));
                Cell { height, ..Cell::blank(width) }
            }
        }
    }

    fn place_link(
        &self,
        section: &Section,
        item: &Item,
        class: &Classification,
        (row, column): (usize, u32),
    ) -> Result<Placed, DashboardError> {
        let url = shortcut_url(section, item, class.url_extension)?;
        let source = item_path(section, item, class.image_extension)?;
        let name = icon_file_name(row, column);
        let target = self.output.join(ICONS_DIR).join(&name);
        if is_svg(&source) {
            copy_svg(&source, &target)?;
        } else {
            let svg = imaging::create_icon_svg(self.backend, &source, self.options.background)?;
            cache::write_output(&target, svg)?;
        }
        cache::copy_mtime(&source, &target)?;
        Ok(Placed {
            url,
            icon: Some(site_url(ICONS_DIR, &name)),
            written: Some(target),
        })
    }

    fn place_image(
        &self,
        section: &Section,
        item: &Item,
        class: &Classification,
        (row, column): (usize, u32),
        block: (u32, u32),
    ) -> Result<Placed, DashboardError> {
        let source = item_path(section, item, class.image_extension)?;
        let name = image_file_name(row, column);
        let target = self.output.join(IMAGES_DIR).join(&name);
        if is_svg(&source) {
            copy_svg(&source, &target)?;
        } else {
            let svg = imaging::create_block_svg(self.backend, &source, block, self.options.background)?;
            cache::write_output(&target, svg)?;
        }
        cache::copy_mtime(&source, &target)?;
        Ok(Placed {
            url: site_url(IMAGES_DIR, &name),
            icon: None,
            written: Some(target),
        })
    }
}

fn item_path(section: &Section, item: &Item, extension: Option<&str>) -> Result<PathBuf, DashboardError> {
    extension
        .and_then(|ext| item.file_for(ext))
        .map(|file| section.file_path(file))
        .ok_or_else(|| DashboardError::MissingAsset(item.basename.clone()))
}

fn shortcut_url(section: &Section, item: &Item, extension: Option<&str>) -> Result<String, DashboardError> {
    let path = item_path(section, item, extension)?;
    Ok(scan::read_shortcut_url(&path)?)
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

fn copy_svg(source: &Path, target: &Path) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, target)?;
    Ok(())
}
