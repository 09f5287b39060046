//! End-to-end runs of the library against real files.
//!
//! These use the pure-Rust image backend and never spawn pandoc or ffmpeg:
//! the fixtures contain no documents and no videos.

use chrono::{TimeZone, Utc};
use docs_to_markdown::cache::FileAction;
use docs_to_markdown::convert::Pandoc;
use docs_to_markdown::dashboard::{self, DashboardOptions};
use docs_to_markdown::docs::{self, DocsOptions};
use docs_to_markdown::imaging::{FfmpegBackend, RustBackend};
use docs_to_markdown::slideshow::{self, SlideshowOptions};
use image::{ImageBuffer, Rgba};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_png(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = ImageBuffer::from_fn(width, height, |x, y| Rgba([(x * 7) as u8, (y * 5) as u8, 90, 255]));
    img.save(path).unwrap();
}

fn write_file(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn dashboard_writes_rows_and_svg_assets() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("dashboard");
    let output = tmp.path().join("site");
    write_file(
        &input.join("010-Services/1 Mail.url"),
        "[InternetShortcut]\nURL=https://mail.example.com\n",
    );
    write_png(&input.join("010-Services/2 Mail.png"), 32, 24);
    write_png(&input.join("010-Services/3 Rota.png"), 90, 160);

    let result = dashboard::generate(&input, &output, &DashboardOptions::default(), &RustBackend::new()).unwrap();

    assert_eq!(result.rows.len(), 1);
    let row = fs::read_to_string(output.join("Row001.md")).unwrap();
    assert!(row.starts_with("---\ntitle: Services\n"));
    assert!(row.contains("col1Type: link\n"));
    assert!(row.contains("col1URL: https://mail.example.com\n"));
    assert!(row.contains("col2Type: image\n"));

    let icon = fs::read_to_string(output.join("static/icons/1-1-icon.svg")).unwrap();
    assert!(icon.starts_with("<svg"));
    assert!(icon.contains("data:image/png;base64,"));
    assert!(output.join("static/images/1-2.svg").exists());
    assert_eq!(result.report.stats.failed, 0);
}

#[test]
fn slideshow_writes_page_and_slides() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("slides");
    let output = tmp.path().join("show");
    write_png(&input.join("1 Welcome.png"), 160, 90);
    write_file(&input.join("2 Notice.gif"), "GIF89a");

    let started = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let result = slideshow::generate(
        &input,
        &output,
        &SlideshowOptions::default(),
        &RustBackend::new(),
        &FfmpegBackend::new(),
        &started,
    )
    .unwrap();

    assert_eq!(result.resources(), vec!["1-1700000000.svg", "2-1700000000.gif"]);
    assert!(output.join("1-1700000000.svg").exists());
    let page = fs::read_to_string(output.join("index.html")).unwrap();
    assert!(page.contains("1-1700000000.svg"));
    assert!(page.contains("id=\"slideshow\""));
}

#[test]
fn docs_copy_only_tree_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("docs");
    let output = tmp.path().join("content");
    write_file(&input.join("style.css"), "body {}");
    write_file(&input.join("Guides/readme.txt"), "see the guides");

    let options = DocsOptions::new(&output);
    let converter = Pandoc::new();

    let first = docs::convert_tree(&input, &options, &converter).unwrap();
    assert_eq!(first.stats.copied, 2);
    assert_eq!(
        fs::read_to_string(output.join("Guides/readme.txt")).unwrap(),
        "see the guides"
    );

    let second = docs::convert_tree(&input, &options, &converter).unwrap();
    assert_eq!(second.stats.copied, 0);
    assert_eq!(second.stats.up_to_date, 2);
    assert!(second.events.iter().all(|e| e.action == FileAction::UpToDate));
}
