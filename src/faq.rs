//! FAQ folder conversion.
//!
//! A flat folder of answers: documents become Markdown pages and `.mp4`
//! clips become 240×240 `.webm` thumbnails, centre-cropped to a square
//! with normalised audio. Sub-folders and other files are ignored.
//!
//! Each video is transcoded into a hidden partial file next to its target
//! and renamed into place, so an interrupted run never leaves a truncated
//! `.webm` that looks current.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cache::{self, FileAction, RunReport};
use crate::classify::VIDEO_EXTENSIONS;
use crate::convert::{self, ConvertError, Converter, DocumentOptions};
use crate::imaging::{self, BackendError, FAQ_VIDEO_SIZE, VideoBackend};
use crate::types::Asset;

#[derive(Error, Debug)]
pub enum FaqError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input folder not found: {0}")]
    MissingInput(PathBuf),
    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),
    #[error("Video error: {0}")]
    Video(#[from] BackendError),
}

pub const VIDEO_OUTPUT_EXTENSION: &str = "webm";

/// Sorted, visible, top-level files of a folder.
fn folder_files(input: &Path) -> Result<Vec<String>, FaqError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(input)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || !entry.file_type()?.is_file() {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Convert every document and video directly inside `input`.
pub fn convert_folder(
    input: &Path,
    output: &Path,
    document: &DocumentOptions,
    converter: &dyn Converter,
    video: &impl VideoBackend,
) -> Result<RunReport, FaqError> {
    if !input.is_dir() {
        return Err(FaqError::MissingInput(input.to_path_buf()));
    }
    fs::create_dir_all(output)?;
    let mut report = RunReport::default();

    for name in folder_files(input)? {
        let asset = Asset::from_file_name(&name);
        let source = input.join(&name);

        let (target, action) = if convert::is_document(&source) {
            let target = output.join(format!("{}.md", asset.basename));
            let action = convert::convert_if_changed(converter, &source, &target, document).map_err(FaqError::from);
            (target, action)
        } else if VIDEO_EXTENSIONS.contains(&asset.extension.as_str()) {
            let target = output.join(format!("{}.{VIDEO_OUTPUT_EXTENSION}", asset.basename));
            let action = thumbnail_if_changed(video, &source, &target);
            (target, action)
        } else {
            tracing::debug!(file = %name, "not an FAQ asset, ignoring");
            continue;
        };

        match action {
            Ok(action) => report.record(name.as_str(), Some(target), action),
            Err(e) => {
                tracing::error!(file = %source.display(), error = %e, "FAQ asset failed");
                report.record(name.as_str(), None, FileAction::Failed(e.to_string()));
            }
        }
    }

    Ok(report)
}

fn partial_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    target.with_file_name(format!(".partial-{name}"))
}

fn thumbnail_if_changed(video: &impl VideoBackend, source: &Path, target: &Path) -> Result<FileAction, FaqError> {
    if cache::is_up_to_date(source, target) {
        return Ok(FileAction::UpToDate);
    }
    let partial = partial_path(target);
    if let Err(e) = imaging::square_video_thumbnail(video, source, &partial, FAQ_VIDEO_SIZE) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    fs::rename(&partial, target)?;
    cache::copy_mtime(source, target)?;
    Ok(FileAction::Converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::FakeConverter;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::create_text_file;
    use tempfile::TempDir;

    #[test]
    fn documents_and_videos_are_converted() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("faq");
        let output = tmp.path().join("out");
        create_text_file(&input.join("How do I log in.docx"), "docx");
        create_text_file(&input.join("login.mp4"), "video");
        create_text_file(&input.join("notes.txt"), "ignored");
        create_text_file(&input.join("nested/deep.docx"), "ignored");

        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1920,
            height: 1080,
        }]);
        let converter = FakeConverter::new("Use your staff number.\n");
        let report = convert_folder(&input, &output, &DocumentOptions::default(), &converter, &backend).unwrap();

        assert!(output.join("How do I log in.md").exists());
        assert_eq!(fs::read_to_string(output.join("login.webm")).unwrap(), "mock video");
        assert!(!output.join(".partial-login.webm").exists());
        assert!(!output.join("notes.txt").exists());
        assert_eq!(report.stats.converted, 2);
        assert_eq!(converter.call_count(), 1);

        let filter = backend.get_operations().into_iter().find_map(|op| match op {
            RecordedOp::Transcode { filter, .. } => Some(filter),
            _ => None,
        });
        assert_eq!(filter.as_deref(), Some("crop=1080:1080:420:0,scale=240:240,setsar=1"));
    }

    #[test]
    fn unchanged_video_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("faq");
        let output = tmp.path().join("out");
        create_text_file(&input.join("clip.MP4"), "video");

        let backend = MockBackend::new();
        let converter = FakeConverter::new("");
        convert_folder(&input, &output, &DocumentOptions::default(), &converter, &backend).unwrap();
        let again = convert_folder(&input, &output, &DocumentOptions::default(), &converter, &backend).unwrap();

        assert_eq!(again.stats.up_to_date, 1);
        let probes = backend
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Probe(_)))
            .count();
        assert_eq!(probes, 1);
    }

    #[test]
    fn failed_probe_leaves_no_output() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("faq");
        let output = tmp.path().join("out");
        create_text_file(&input.join("broken.mp4"), "not a video");

        let backend = MockBackend::failing_on(&["broken.mp4"]);
        let report = convert_folder(&input, &output, &DocumentOptions::default(), &FakeConverter::new(""), &backend)
            .unwrap();

        assert_eq!(report.stats.failed, 1);
        assert!(!output.join("broken.webm").exists());
    }

    #[test]
    fn partial_file_is_hidden_sibling() {
        assert_eq!(
            partial_path(Path::new("/out/clip.webm")),
            PathBuf::from("/out/.partial-clip.webm")
        );
    }
}
