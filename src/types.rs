//! Shared types produced by the scanner and consumed by every entry point.

use std::collections::BTreeSet;
use std::path::PathBuf;

/// One physical file, split into basename and lowercase extension.
///
/// The split happens at the last `.`; a file without one has an empty
/// extension. `0001 Report.final.docx` → (`0001 Report.final`, `docx`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub basename: String,
    pub extension: String,
    /// Extension exactly as it appears on disk (needed to rebuild the path).
    pub raw_extension: String,
}

impl Asset {
    pub fn from_file_name(file_name: &str) -> Self {
        match file_name.rsplit_once('.') {
            Some((base, ext)) => Self {
                basename: base.to_string(),
                extension: ext.to_lowercase(),
                raw_extension: ext.to_string(),
            },
            None => Self {
                basename: file_name.to_string(),
                extension: String::new(),
                raw_extension: String::new(),
            },
        }
    }

    pub fn file_name(&self) -> String {
        if self.raw_extension.is_empty() {
            self.basename.clone()
        } else {
            format!("{}.{}", self.basename, self.raw_extension)
        }
    }
}

/// One grid cell: a basename plus every extension found for it.
///
/// `extensions` holds lowercase extensions; `files` maps each of them back
/// to the on-disk file name so case-preserving filesystems still resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub basename: String,
    pub extensions: BTreeSet<String>,
    pub files: Vec<String>,
}

impl Item {
    pub fn new(basename: impl Into<String>) -> Self {
        Self {
            basename: basename.into(),
            extensions: BTreeSet::new(),
            files: Vec::new(),
        }
    }

    pub fn add(&mut self, asset: &Asset) {
        if self.extensions.insert(asset.extension.clone()) {
            self.files.push(asset.file_name());
        }
    }

    /// Builder-style helper, mostly for tests.
    pub fn with_extension(mut self, ext: &str) -> Self {
        let asset = Asset {
            basename: self.basename.clone(),
            extension: ext.to_lowercase(),
            raw_extension: ext.to_string(),
        };
        self.add(&asset);
        self
    }

    /// On-disk file name for a lowercase extension of this item.
    pub fn file_for(&self, extension: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| Asset::from_file_name(f).extension == extension)
            .map(String::as_str)
    }

    pub fn has_extension(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    /// Take over every file of `other` whose extension this item lacks.
    pub fn absorb(&mut self, other: Item) {
        for file in other.files {
            self.add(&Asset::from_file_name(&file));
        }
    }
}

/// A folder's worth of items, in lexicographic basename order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Absolute (or input-rooted) folder path.
    pub path: PathBuf,
    /// Folder path relative to the scan root; empty for the root itself.
    pub relative: PathBuf,
    pub items: Vec<Item>,
}

impl Section {
    /// Row title for this section: the relative folder path, `/`-separated,
    /// with the numeric prefix removed from its last component only. The
    /// root section has no title.
    pub fn title(&self) -> Option<String> {
        let name = self.relative.file_name()?.to_string_lossy();
        let last = crate::naming::strip_numeric_prefix(&name);
        let parents: Vec<String> = self
            .relative
            .parent()
            .into_iter()
            .flat_map(|p| p.components())
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        if parents.is_empty() {
            Some(last)
        } else {
            Some(format!("{}/{last}", parents.join("/")))
        }
    }

    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.path.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_splits_on_last_dot() {
        let a = Asset::from_file_name("0001 Report.final.DOCX");
        assert_eq!(a.basename, "0001 Report.final");
        assert_eq!(a.extension, "docx");
        assert_eq!(a.file_name(), "0001 Report.final.DOCX");
    }

    #[test]
    fn asset_without_extension() {
        let a = Asset::from_file_name("README");
        assert_eq!(a.basename, "README");
        assert_eq!(a.extension, "");
        assert_eq!(a.file_name(), "README");
    }

    #[test]
    fn item_resolves_original_file_name() {
        let mut item = Item::new("icon");
        item.add(&Asset::from_file_name("icon.PNG"));
        item.add(&Asset::from_file_name("icon.url"));
        assert_eq!(item.file_for("png"), Some("icon.PNG"));
        assert_eq!(item.file_for("url"), Some("icon.url"));
        assert_eq!(item.file_for("jpg"), None);
    }

    #[test]
    fn absorb_keeps_foreign_file_names() {
        let mut link = Item::new("1 Intro").with_extension("url");
        let mut icon = Item::new("2 Intro");
        icon.add(&Asset::from_file_name("2 Intro.png"));
        link.absorb(icon);
        assert!(link.has_extension("png"));
        assert_eq!(link.file_for("png"), Some("2 Intro.png"));
        assert_eq!(link.file_for("url"), Some("1 Intro.url"));
    }

    #[test]
    fn section_title_strips_prefix() {
        let section = Section {
            path: PathBuf::from("/in/20 Charts"),
            relative: PathBuf::from("20 Charts"),
            items: vec![],
        };
        assert_eq!(section.title().as_deref(), Some("Charts"));
    }

    #[test]
    fn nested_section_title_keeps_parent_path() {
        let section = Section {
            path: PathBuf::from("/in/10 Services/1 Nested"),
            relative: PathBuf::from("10 Services/1 Nested"),
            items: vec![],
        };
        assert_eq!(section.title().as_deref(), Some("10 Services/Nested"));
    }

    #[test]
    fn root_section_has_no_title() {
        let section = Section {
            path: PathBuf::from("/in"),
            relative: PathBuf::new(),
            items: vec![],
        };
        assert_eq!(section.title(), None);
    }
}
