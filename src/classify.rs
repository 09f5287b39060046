//! Asset classification: what an item *is* on the dashboard grid.
//!
//! The kind of an item depends only on its label and on which extensions
//! share its basename:
//!
//! | Label / extensions present | Kind |
//! |---|---|
//! | label is `blank` (any case) | `blank` |
//! | URL + image | `link` (URL with an icon) |
//! | URL only | `iframe` (embedded page) |
//! | image only | `image` |
//! | anything else | `blank` |
//!
//! When several URL or image extensions are present the first one in the
//! priority lists below wins, so classification never depends on the order
//! in which files were discovered.

use crate::naming::strip_numeric_prefix;
use crate::types::Item;
use serde::Serialize;
use std::fmt;

/// Shortcut extensions, in priority order.
pub const URL_EXTENSIONS: &[&str] = &["url", "txt"];

/// Raster formats the compositor can decode, in priority order.
pub const BITMAP_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "ico"];

/// Everything that may serve as a picture (bitmaps plus SVG).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "ico", "svg"];

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4"];

/// Presentation type of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Image,
    Link,
    Iframe,
    Blank,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Image => "image",
            ItemKind::Link => "link",
            ItemKind::Iframe => "iframe",
            ItemKind::Blank => "blank",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: ItemKind,
    pub label: String,
    pub image_extension: Option<&'static str>,
    pub url_extension: Option<&'static str>,
}

/// First extension from `candidates` present on the item.
pub fn first_present(item: &Item, candidates: &[&'static str]) -> Option<&'static str> {
    candidates.iter().copied().find(|ext| item.has_extension(ext))
}

pub fn is_blank_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("blank")
}

/// Classify an item from its label and extension set.
pub fn classify(item: &Item) -> Classification {
    let label = strip_numeric_prefix(&item.basename);
    let url_extension = first_present(item, URL_EXTENSIONS);
    let image_extension = first_present(item, IMAGE_EXTENSIONS);

    let kind = if is_blank_label(&label) {
        ItemKind::Blank
    } else {
        match (url_extension, image_extension) {
            (Some(_), Some(_)) => ItemKind::Link,
            (Some(_), None) => ItemKind::Iframe,
            (None, Some(_)) => ItemKind::Image,
            (None, None) => ItemKind::Blank,
        }
    };

    Classification {
        kind,
        label,
        image_extension,
        url_extension,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(basename: &str, exts: &[&str]) -> Item {
        exts.iter()
            .fold(Item::new(basename), |item, ext| item.with_extension(ext))
    }

    #[test]
    fn url_with_image_is_link() {
        let c = classify(&item("1 Intro", &["url", "png"]));
        assert_eq!(c.kind, ItemKind::Link);
        assert_eq!(c.label, "Intro");
        assert_eq!(c.url_extension, Some("url"));
        assert_eq!(c.image_extension, Some("png"));
    }

    #[test]
    fn url_alone_is_iframe() {
        let c = classify(&item("Status Page", &["url"]));
        assert_eq!(c.kind, ItemKind::Iframe);
        assert_eq!(c.image_extension, None);
    }

    #[test]
    fn txt_counts_as_shortcut() {
        assert_eq!(classify(&item("feed", &["txt"])).kind, ItemKind::Iframe);
    }

    #[test]
    fn image_alone_is_image() {
        let c = classify(&item("3 Chart", &["png"]));
        assert_eq!(c.kind, ItemKind::Image);
        assert_eq!(c.label, "Chart");
    }

    #[test]
    fn blank_label_wins_over_extensions() {
        assert_eq!(classify(&item("blank", &["txt"])).kind, ItemKind::Blank);
        assert_eq!(
            classify(&item("05 BLANK", &["png", "url"])).kind,
            ItemKind::Blank
        );
    }

    #[test]
    fn unknown_extensions_are_blank() {
        let c = classify(&item("notes", &["docx", "pdf"]));
        assert_eq!(c.kind, ItemKind::Blank);
        assert_eq!(c.label, "notes");
    }

    #[test]
    fn classification_is_order_independent() {
        let a = classify(&item("x", &["jpg", "txt", "url", "png"]));
        let b = classify(&item("x", &["png", "url", "jpg", "txt"]));
        assert_eq!(a, b);
        assert_eq!(a.url_extension, Some("url"));
        assert_eq!(a.image_extension, Some("png"));
    }

    #[test]
    fn uppercase_extensions_recognised() {
        assert_eq!(classify(&item("Logo", &["PNG"])).kind, ItemKind::Image);
    }

    #[test]
    fn kind_renders_lowercase() {
        assert_eq!(ItemKind::Iframe.to_string(), "iframe");
        assert_eq!(
            serde_json::to_string(&ItemKind::Link).unwrap(),
            "\"link\""
        );
    }
}
