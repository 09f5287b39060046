//! Filesystem scanning: folders become sections, files become items.
//!
//! ## Directory Structure
//!
//! ```text
//! input/
//! ├── config.xlsx              # Run configuration (optional, extracted)
//! ├── 1 Intro.url              # Shortcut ─┐ paired by label: one "link"
//! ├── 2 Intro.png              # Icon ─────┘
//! ├── 3 Chart.png              # Image
//! ├── blank.txt                # Explicit spacer
//! ├── 10 Services/             # Section titled "Services"
//! │   ├── 1 Status.url         # Shortcut with no icon: "iframe"
//! │   └── 2 Uptime.png
//! └── 20 Reports/
//!     └── ...
//! ```
//!
//! ## Rules
//!
//! - Each folder's own files form one [`Section`], emitted before the
//!   sections of its sub-folders. Folders and files are visited in sorted
//!   order; hidden entries (leading `.`) are skipped.
//! - Files split at the last `.` and coalesce by basename into [`Item`]s,
//!   ordered lexicographically by basename.
//! - **Icon pairing**: a shortcut-only item absorbs the image of another
//!   image-only item with the same label in the same section, keeping the
//!   earlier position.
//! - `config` and `items` pseudo-items (any case) are pulled out of the
//!   section and returned as configuration / playlist sources.
//! - An unreadable root is an error. An unreadable sub-folder is logged,
//!   returned as a [`SkippedFolder`], and its siblings are still scanned.

use crate::classify::{IMAGE_EXTENSIONS, URL_EXTENSIONS, first_present};
use crate::naming::strip_numeric_prefix;
use crate::types::{Asset, Item, Section};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input folder not found: {0}")]
    MissingInput(PathBuf),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Shortcut file has no URL: {0}")]
    EmptyShortcut(PathBuf),
}

/// Basename of the per-run configuration pseudo-item.
pub const CONFIG_BASENAME: &str = "config";

/// Basename of the slideshow playlist pseudo-item.
pub const ITEMS_BASENAME: &str = "items";

/// Extensions a configuration pseudo-item may carry, in priority order.
pub const CONFIG_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls", "yaml", "yml", "toml"];

/// Extensions a playlist pseudo-item may carry, in priority order.
pub const ITEMS_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

/// Everything found under the input root.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub sections: Vec<Section>,
    pub config_sources: Vec<PathBuf>,
    pub items_sources: Vec<PathBuf>,
    pub skipped: Vec<SkippedFolder>,
}

/// A sub-folder that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFolder {
    /// Path relative to the scan root.
    pub relative: PathBuf,
    pub error: String,
}

impl SkippedFolder {
    fn new(root: &Path, path: &Path, error: &dyn std::fmt::Display) -> Self {
        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        tracing::error!(folder = %relative.display(), %error, "skipping unreadable folder");
        Self {
            relative,
            error: error.to_string(),
        }
    }
}

/// Keep walking past an error below the root; an error on the root itself
/// is returned.
pub fn skip_unreadable(root: &Path, error: walkdir::Error) -> Result<SkippedFolder, walkdir::Error> {
    if error.depth() == 0 {
        return Err(error);
    }
    let path = error.path().unwrap_or(root).to_path_buf();
    Ok(SkippedFolder::new(root, &path, &error))
}

/// Scan `root` into sections (dashboard layout).
pub fn scan_sections(root: &Path) -> Result<ScanResult, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingInput(root.to_path_buf()));
    }
    let mut result = ScanResult::default();
    scan_directory(root, root, &mut result)?;
    Ok(result)
}

fn scan_directory(path: &Path, root: &Path, result: &mut ScanResult) -> Result<(), ScanError> {
    let (files, subdirs) = collect_entries(path)?;

    let mut items = build_items(&files);
    if let Some(source) = extract_pseudo_item(&mut items, CONFIG_BASENAME, CONFIG_EXTENSIONS) {
        result.config_sources.push(path.join(source));
    }
    if let Some(source) = extract_pseudo_item(&mut items, ITEMS_BASENAME, ITEMS_EXTENSIONS) {
        result.items_sources.push(path.join(source));
    }
    let items = pair_icons(items);

    let relative = path.strip_prefix(root).unwrap_or(Path::new("")).to_path_buf();
    tracing::debug!(section = %relative.display(), items = items.len(), "scanned section");
    result.sections.push(Section {
        path: path.to_path_buf(),
        relative,
        items,
    });

    for subdir in subdirs {
        scan_subtree(&subdir, root, result);
    }
    Ok(())
}

/// Scan a sub-folder, recording it as skipped if it cannot be read.
fn scan_subtree(path: &Path, root: &Path, result: &mut ScanResult) {
    if let Err(e) = scan_directory(path, root, result) {
        result.skipped.push(SkippedFolder::new(root, path, &e));
    }
}

/// Sorted visible file names and sub-folder paths of one folder.
fn collect_entries(path: &Path) -> Result<(Vec<String>, Vec<PathBuf>), ScanError> {
    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        if entry.file_type()?.is_dir() {
            subdirs.push(entry.path());
        } else {
            files.push(name);
        }
    }
    files.sort();
    subdirs.sort();
    Ok((files, subdirs))
}

/// Coalesce file names into items keyed by basename.
pub fn build_items(file_names: &[String]) -> Vec<Item> {
    let mut by_basename: BTreeMap<String, Item> = BTreeMap::new();
    for name in file_names {
        let asset = Asset::from_file_name(name);
        by_basename
            .entry(asset.basename.clone())
            .or_insert_with(|| Item::new(asset.basename.clone()))
            .add(&asset);
    }
    by_basename.into_values().collect()
}

/// Remove the pseudo-item named `basename` and return its preferred file.
fn extract_pseudo_item(items: &mut Vec<Item>, basename: &str, extensions: &[&str]) -> Option<String> {
    let index = items
        .iter()
        .position(|i| i.basename.eq_ignore_ascii_case(basename))?;
    let item = items.remove(index);
    let file = extensions
        .iter()
        .find_map(|ext| item.file_for(ext))
        .map(str::to_string);
    if file.is_none() {
        tracing::warn!(basename = %item.basename, "ignoring pseudo-item with unsupported extension");
    }
    file
}

fn is_bare_shortcut(item: &Item) -> bool {
    first_present(item, URL_EXTENSIONS).is_some() && first_present(item, IMAGE_EXTENSIONS).is_none()
}

fn is_image_only(item: &Item) -> bool {
    !item.extensions.is_empty()
        && item
            .extensions
            .iter()
            .all(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Merge shortcut-only items with same-label image-only items.
pub fn pair_icons(items: Vec<Item>) -> Vec<Item> {
    let mut slots: Vec<Option<Item>> = items.into_iter().map(Some).collect();

    for i in 0..slots.len() {
        let label = match &slots[i] {
            Some(item) if is_bare_shortcut(item) => strip_numeric_prefix(&item.basename),
            _ => continue,
        };
        let partner = (0..slots.len()).find(|&j| {
            j != i
                && slots[j].as_ref().is_some_and(|other| {
                    is_image_only(other) && strip_numeric_prefix(&other.basename) == label
                })
        });
        if let Some(j) = partner
            && let (Some(mut shortcut), Some(icon)) = (slots[i].take(), slots[j].take())
        {
            tracing::debug!(shortcut = %shortcut.basename, icon = %icon.basename, "paired icon");
            shortcut.absorb(icon);
            slots[i.min(j)] = Some(shortcut);
        }
    }

    slots.into_iter().flatten().collect()
}

/// Read the target of a `.url` or `.txt` shortcut.
///
/// `.url` files are Windows `InternetShortcut` INI files; the value of the
/// first `URL=` line wins. Anything else (and a `.url` without such a line)
/// yields its first non-empty line.
pub fn read_shortcut_url(path: &Path) -> Result<String, ScanError> {
    let content = fs::read_to_string(path)?;
    let url = content
        .lines()
        .find_map(|line| line.trim().strip_prefix("URL="))
        .or_else(|| content.lines().map(str::trim).find(|l| !l.is_empty()))
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    if url.is_empty() {
        return Err(ScanError::EmptyShortcut(path.to_path_buf()));
    }
    Ok(url)
}

/// A flat, sorted list of every file under a root (slideshow layout).
#[derive(Debug, Default)]
pub struct FlatScan {
    /// Paths relative to the root.
    pub files: Vec<PathBuf>,
    pub config_sources: Vec<PathBuf>,
    pub items_sources: Vec<PathBuf>,
    pub skipped: Vec<SkippedFolder>,
}

/// Walk `root` recursively; root-level `config`/`items` files are extracted.
pub fn scan_flat(root: &Path) -> Result<FlatScan, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingInput(root.to_path_buf()));
    }
    let mut scan = FlatScan::default();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                scan.skipped.push(skip_unreadable(root, e)?);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path()).to_path_buf();
        if entry.depth() == 1 {
            let asset = Asset::from_file_name(&entry.file_name().to_string_lossy());
            if asset.basename.eq_ignore_ascii_case(CONFIG_BASENAME)
                && CONFIG_EXTENSIONS.contains(&asset.extension.as_str())
            {
                scan.config_sources.push(entry.path().to_path_buf());
                continue;
            }
            if asset.basename.eq_ignore_ascii_case(ITEMS_BASENAME)
                && ITEMS_EXTENSIONS.contains(&asset.extension.as_str())
            {
                scan.items_sources.push(entry.path().to_path_buf());
                continue;
            }
        }
        scan.files.push(relative);
    }
    scan.files.sort();
    Ok(scan)
}
