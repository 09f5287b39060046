//! Slideshow generation: a folder of normalised assets plus `index.html`.
//!
//! Every file under the input (sub-folders included, sorted by relative
//! path) becomes one slide named `{n}-{timestamp}.{ext}`, where the
//! timestamp is the run start in Unix seconds, so browsers never show a
//! stale cached slide.
//!
//! | Source | Output |
//! |---|---|
//! | jpg, jpeg, png, ico | padded SVG at the block ratio |
//! | mp4 (video processing on) | padded mp4, loudness normalised |
//! | anything else | copied, extension lowercased |
//!
//! A root-level `items.{csv,xls,xlsx}` playlist is embedded in the page as
//! JSON with lowercased column names.

use chrono::{DateTime, TimeZone};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cache::{self, FileAction, RunReport};
use crate::classify::{BITMAP_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::config::Settings;
use crate::imaging::{self, Background, BackendError, ImageBackend, VideoBackend};
use crate::scan::{self, ScanError};
use crate::tabular::{self, Record, TabularError};
use crate::types::Asset;

const CSS: &str = include_str!("../static/slideshow.css");
const JS: &str = include_str!("../static/slideshow.js");

pub const INDEX_FILE: &str = "index.html";
pub const DATE_FORMAT: &str = "%d %m %Y, %H:%M:%S";

#[derive(Error, Debug)]
pub enum SlideshowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Playlist error: {0}")]
    Playlist(#[from] TabularError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Media error: {0}")]
    Media(#[from] BackendError),
}

#[derive(Debug, Clone)]
pub struct SlideshowOptions {
    /// Block ratio, width:height.
    pub block: (u32, u32),
    pub process_video: bool,
    pub background: Background,
}

impl Default for SlideshowOptions {
    fn default() -> Self {
        Self {
            block: crate::config::DEFAULT_BLOCK,
            process_video: true,
            background: Background::white(),
        }
    }
}

impl From<&Settings> for SlideshowOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            block: settings.block,
            process_video: settings.process_video,
            background: Background::white(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    /// 1-based position in the show.
    pub index: usize,
    pub source: PathBuf,
    /// Output file name, relative to the output folder.
    pub file: String,
}

#[derive(Debug, Default)]
pub struct SlideshowReport {
    pub slides: Vec<Slide>,
    pub timestamp: i64,
    pub report: RunReport,
}

impl SlideshowReport {
    pub fn resources(&self) -> Vec<String> {
        self.slides.iter().map(|s| s.file.clone()).collect()
    }
}

pub fn slide_file_name(index: usize, timestamp: i64, extension: &str) -> String {
    if extension.is_empty() {
        format!("{index}-{timestamp}")
    } else {
        format!("{index}-{timestamp}.{extension}")
    }
}

/// Generate the slideshow for `input` into `output`, stamped with `started`.
pub fn generate<Tz: TimeZone>(
    input: &Path,
    output: &Path,
    options: &SlideshowOptions,
    images: &impl ImageBackend,
    video: &impl VideoBackend,
    started: &DateTime<Tz>,
) -> Result<SlideshowReport, SlideshowError>
where
    Tz::Offset: std::fmt::Display,
{
    let scan = scan::scan_flat(input)?;
    fs::create_dir_all(output)?;

    let items = match scan.items_sources.first() {
        Some(source) => read_playlist(source)?,
        None => Vec::new(),
    };

    let mut result = SlideshowReport {
        timestamp: started.timestamp(),
        ..Default::default()
    };
    for folder in &scan.skipped {
        result
            .report
            .record(&folder.relative, None, FileAction::Failed(folder.error.clone()));
    }

    for (position, relative) in scan.files.iter().enumerate() {
        let index = position + 1;
        let source = input.join(relative);
        match write_slide(&source, output, index, result.timestamp, options, images, video) {
            Ok((file, action)) => {
                tracing::debug!(source = %relative.display(), file = %file, "slide");
                result.report.record(relative, Some(output.join(&file)), action);
                result.slides.push(Slide {
                    index,
                    source: relative.clone(),
                    file,
                });
            }
            Err(e) => {
                tracing::warn!(source = %source.display(), error = %e, "skipping slide");
                result.report.record(relative, None, FileAction::Failed(e.to_string()));
            }
        }
    }

    let formatted = started.format(DATE_FORMAT).to_string();
    let page = render_index(&result.resources(), result.timestamp, &formatted, &items)?;
    cache::write_output(&output.join(INDEX_FILE), page.into_string())?;

    Ok(result)
}

fn write_slide(
    source: &Path,
    output: &Path,
    index: usize,
    timestamp: i64,
    options: &SlideshowOptions,
    images: &impl ImageBackend,
    video: &impl VideoBackend,
) -> Result<(String, FileAction), SlideshowError> {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = Asset::from_file_name(&file_name).extension;

    let (file, action) = if BITMAP_EXTENSIONS.contains(&extension.as_str()) {
        let file = slide_file_name(index, timestamp, "svg");
        let svg = imaging::create_block_svg(images, source, options.block, options.background)?;
        cache::write_output(&output.join(&file), svg)?;
        (file, FileAction::Converted)
    } else if options.process_video && VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        let file = slide_file_name(index, timestamp, &extension);
        imaging::pad_video(video, source, &output.join(&file), options.block, options.background)?;
        (file, FileAction::Converted)
    } else {
        let file = slide_file_name(index, timestamp, &extension);
        fs::copy(source, output.join(&file))?;
        (file, FileAction::Copied)
    };
    cache::copy_mtime(source, &output.join(&file))?;
    Ok((file, action))
}

/// Read a playlist spreadsheet, lowercasing its column names.
pub fn read_playlist(path: &Path) -> Result<Vec<Record>, SlideshowError> {
    let records = tabular::read_records(path)?;
    Ok(records
        .into_iter()
        .map(|record| {
            record
                .into_iter()
                .map(|(key, value)| (key.to_lowercase(), value))
                .collect()
        })
        .collect())
}

/// Serialise a value for inclusion inside a `<script>` element.
fn script_json(value: &impl serde::Serialize) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

pub fn render_index(
    resources: &[String],
    timestamp: i64,
    generated: &str,
    items: &[Record],
) -> Result<Markup, serde_json::Error> {
    let data = format!(
        "const resources = {};\nconst timestamp = {timestamp};\nconst items = {};\n",
        script_json(&resources)?,
        script_json(&items)?,
    );
    Ok(html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Slideshow" }
                style { (PreEscaped(CSS)) }
            }
            body {
                div id="slideshow" data-timestamp=(timestamp) {}
                p.generated { "Generated " (generated) }
                script { (PreEscaped(data)) }
                script { (PreEscaped(JS)) }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::*;
    use chrono::{Local, Utc};
    use tempfile::TempDir;

    fn started() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 9).unwrap()
    }

    // =========================================================================
    // Page rendering
    // =========================================================================

    #[test]
    fn index_embeds_resources_and_items() {
        let mut item = Record::new();
        item.insert("duration".into(), "5".into());
        let page = render_index(
            &["1-100.svg".to_string(), "2-100.mp4".to_string()],
            100,
            "05 03 2024, 14:30:09",
            &[item],
        )
        .unwrap()
        .into_string();

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains(r#"const resources = ["1-100.svg","2-100.mp4"];"#));
        assert!(page.contains("const timestamp = 100;"));
        assert!(page.contains(r#"const items = [{"duration":"5"}];"#));
        assert!(page.contains("Generated 05 03 2024, 14:30:09"));
        assert!(page.contains(r#"data-timestamp="100""#));
    }

    #[test]
    fn script_data_cannot_close_the_element() {
        let json = script_json(&vec!["</script><b>".to_string()]).unwrap();
        assert!(!json.contains("</script>"));
    }

    #[test]
    fn slide_names_carry_timestamp() {
        assert_eq!(slide_file_name(3, 1709649009, "png"), "3-1709649009.png");
        assert_eq!(slide_file_name(1, 5, ""), "1-5");
    }

    // =========================================================================
    // End to end
    // =========================================================================

    #[test]
    fn assets_are_normalised() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        create_test_png(&input.join("a.png"), 16, 9);
        create_text_file(&input.join("b.mp4"), "video");
        create_text_file(&input.join("sub/c.MP3"), "audio");

        let backend = MockBackend::new();
        let when = started();
        let result = generate(&input, &output, &SlideshowOptions::default(), &backend, &backend, &when).unwrap();

        let ts = when.timestamp();
        assert_eq!(
            result.resources(),
            vec![
                format!("1-{ts}.svg"),
                format!("2-{ts}.mp4"),
                format!("3-{ts}.mp3"),
            ]
        );
        assert!(fs::read_to_string(output.join(format!("1-{ts}.svg"))).unwrap().starts_with("<svg"));
        assert_eq!(fs::read_to_string(output.join(format!("3-{ts}.mp3"))).unwrap(), "audio");
        assert_eq!(result.report.stats.converted, 2);
        assert_eq!(result.report.stats.copied, 1);

        let transcodes: Vec<RecordedOp> = backend
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Transcode { .. }))
            .collect();
        assert_eq!(transcodes.len(), 1);

        let page = fs::read_to_string(output.join(INDEX_FILE)).unwrap();
        assert!(page.contains(&format!("const timestamp = {ts};")));
        assert!(page.contains("Generated 05 03 2024, 14:30:09"));
    }

    #[test]
    fn slides_carry_source_mtime() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        create_test_png(&input.join("a.png"), 16, 9);
        create_text_file(&input.join("b.mp4"), "video");
        create_text_file(&input.join("c.gif"), "gif");
        for name in ["a.png", "b.mp4", "c.gif"] {
            backdate(&input.join(name), 86_400);
        }

        let backend = MockBackend::new();
        let result = generate(&input, &output, &SlideshowOptions::default(), &backend, &backend, &started()).unwrap();

        for slide in &result.slides {
            assert!(
                cache::is_up_to_date(&input.join(&slide.source), &output.join(&slide.file)),
                "{} does not carry the mtime of {}",
                slide.file,
                slide.source.display()
            );
        }
        assert_eq!(result.slides.len(), 3);
    }

    #[test]
    fn video_copied_when_processing_disabled() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        create_text_file(&input.join("clip.MP4"), "video");

        let options = SlideshowOptions {
            process_video: false,
            ..Default::default()
        };
        let backend = MockBackend::new();
        let when = Local::now();
        let result = generate(&input, &output, &options, &backend, &backend, &when).unwrap();

        assert_eq!(result.slides[0].file, format!("1-{}.mp4", when.timestamp()));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn failed_video_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        create_text_file(&input.join("1.mp4"), "broken");
        create_test_png(&input.join("2.png"), 4, 4);

        let backend = MockBackend::failing_on(&["1.mp4"]);
        let result = generate(&input, &output, &SlideshowOptions::default(), &backend, &backend, &started()).unwrap();

        assert_eq!(result.slides.len(), 1);
        assert_eq!(result.slides[0].index, 2);
        assert_eq!(result.report.stats.failed, 1);
    }

    #[test]
    fn playlist_is_embedded_with_lowercase_keys() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        create_text_file(&input.join("items.csv"), "File,Duration\n1.png,5\n");
        create_test_png(&input.join("1.png"), 4, 4);

        let backend = MockBackend::new();
        let result = generate(&input, &output, &SlideshowOptions::default(), &backend, &backend, &started()).unwrap();

        assert_eq!(result.slides.len(), 1);
        let page = fs::read_to_string(output.join(INDEX_FILE)).unwrap();
        assert!(page.contains(r#"const items = [{"file":"1.png","duration":"5"}];"#));
    }
}
