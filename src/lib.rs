//! # Docs to Markdown
//!
//! A batch pipeline that turns folders of office documents, spreadsheets,
//! images, videos and link shortcuts into inputs for a static site
//! generator (Hugo or Eleventy). The filesystem is the data source: folder
//! names become section titles, basenames group related files into items,
//! and every run is incremental.
//!
//! # Commands
//!
//! ```text
//! dashboard   input/  →  RowNNN.md + static/icons + static/images
//! slideshow   input/  →  N-<ts>.svg|mp4 + index.html
//! docs        input/  →  Markdown tree (pandoc) + copied assets
//! faq         input/  →  Markdown pages + square .webm thumbnails
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | Leading numeric words (`0007 Annual Review`), zero padding, `Row001.md` style names |
//! | [`types`] | `Asset`, `Item` and `Section`, the grouped view of a folder |
//! | [`scan`] | Walks an input tree into sections of items; shortcut files |
//! | [`classify`] | Decides whether an item is a link, image, iframe or blank |
//! | [`packer`] | Packs cells into fixed-width grid rows |
//! | [`front_matter`] | Ordered YAML front matter with defaults |
//! | [`convert`] | Document → Markdown through an external converter (pandoc) |
//! | [`tabular`] | CSV / XLS / XLSX reading, Markdown tables, CSV writing |
//! | [`imaging`] | Canvas fitting for bitmaps, SVG embedding, ffmpeg video |
//! | [`cache`] | mtime-based freshness, copying, run reports |
//! | [`config`] | YAML / TOML / spreadsheet config, layering, validation |
//! | [`dashboard`] | The dashboard command |
//! | [`slideshow`] | The slideshow command and its HTML page |
//! | [`docs`] | The docs command and its operations |
//! | [`faq`] | The FAQ command |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Incremental by Modification Time
//!
//! An output is current when its modification time equals its source's.
//! Converted documents, copied files, slides, dashboard icons and images and
//! FAQ thumbnails all carry their source's mtime, so a second run over an
//! unchanged tree does no work. Dashboard row files and the slideshow page
//! are rebuilt from the whole folder every run. See [`cache::is_up_to_date`].
//!
//! ## External Tools Behind Traits
//!
//! Pandoc, ffmpeg and ffprobe are invoked as child processes behind the
//! [`convert::Converter`], [`imaging::ImageBackend`] and
//! [`imaging::VideoBackend`] traits. Unit tests swap in recording mocks and
//! never spawn a process. Bitmap padding is pure Rust via the `image` crate.
//!
//! ## Per-File Failure Isolation
//!
//! A broken document or image never aborts a run. The failure is logged,
//! counted in the [`cache::RunReport`] and the run carries on.

pub mod cache;
pub mod classify;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod docs;
pub mod faq;
pub mod front_matter;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod packer;
pub mod scan;
pub mod slideshow;
pub mod tabular;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
