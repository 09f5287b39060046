//! Shared test utilities.
//!
//! Fixture builders for input trees (synthetic PNGs, shortcut files,
//! placeholder documents) and lookups over scanner output that panic with
//! a readable message on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! create_url_file(&tmp.path().join("1 Intro.url"), "https://example.com");
//! create_test_png(&tmp.path().join("2 Intro.png"), 64, 64);
//!
//! let result = scan_sections(tmp.path()).unwrap();
//! let section = find_section(&result, "");
//! assert_item_names(section, &["1 Intro"]);
//! ```

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;

use crate::scan::ScanResult;
use crate::types::Section;

// =========================================================================
// Fixture files
// =========================================================================

fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
}

/// Write a gradient PNG of the given size.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// Write a fully transparent PNG.
pub fn create_transparent_png(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// Write a Windows `InternetShortcut` file.
pub fn create_url_file(path: &Path, url: &str) {
    ensure_parent(path);
    std::fs::write(path, format!("[InternetShortcut]\r\nURL={url}\r\n")).unwrap();
}

/// Write arbitrary text (plain `.txt` shortcuts, placeholder documents).
pub fn create_text_file(path: &Path, contents: &str) {
    ensure_parent(path);
    std::fs::write(path, contents).unwrap();
}

/// Remove every permission bit from a folder. Returns `false` when the
/// folder can still be listed (the tests run as root), so callers can
/// bail out.
#[cfg(unix)]
pub fn make_unreadable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o000)).unwrap();
    if std::fs::read_dir(path).is_ok() {
        make_readable(path);
        return false;
    }
    true
}

/// Undo [`make_unreadable`] so the temp dir can be cleaned up.
#[cfg(unix)]
pub fn make_readable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Move a file's modification time `secs` into the past.
pub fn backdate(path: &Path, secs: u64) {
    let when = std::time::SystemTime::now() - std::time::Duration::from_secs(secs);
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_times(std::fs::FileTimes::new().set_modified(when))
        .unwrap();
}

// =========================================================================
// Scan lookups, panicking with a clear message on miss
// =========================================================================

/// Find a section by its input-relative path (`""` for the root).
pub fn find_section<'a>(result: &'a ScanResult, relative: &str) -> &'a Section {
    result
        .sections
        .iter()
        .find(|s| s.relative == Path::new(relative))
        .unwrap_or_else(|| {
            let all: Vec<String> = result
                .sections
                .iter()
                .map(|s| s.relative.display().to_string())
                .collect();
            panic!("section '{relative}' not found. Available: {all:?}")
        })
}

pub fn item_names(section: &Section) -> Vec<&str> {
    section.items.iter().map(|i| i.basename.as_str()).collect()
}

/// Assert the exact basenames of a section, in order.
pub fn assert_item_names(section: &Section, expected: &[&str]) {
    assert_eq!(
        item_names(section),
        expected,
        "items of section '{}'",
        section.relative.display()
    );
}
