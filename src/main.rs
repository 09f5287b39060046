use clap::{Parser, Subcommand};
use docs_to_markdown::config::{self, ConfigFile, Generator, Settings};
use docs_to_markdown::convert::Pandoc;
use docs_to_markdown::dashboard::{self, DashboardOptions};
use docs_to_markdown::docs::{self, DocsOptions};
use docs_to_markdown::imaging::{FfmpegBackend, RustBackend};
use docs_to_markdown::packer::{EmptyRowPolicy, WidthPolicy};
use docs_to_markdown::slideshow::{self, SlideshowOptions};
use docs_to_markdown::{faq, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let hash = env!("GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{}@{hash}", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "docs-to-markdown")]
#[command(about = "Turn folders of documents, spreadsheets, images and videos into static-site inputs")]
#[command(long_about = "\
Turn folders of documents, spreadsheets, images and videos into static-site inputs

Every command reads --input and writes --output. Both may instead come from
--config (CSV, XLS, XLSX, YAML or TOML: one key per row or mapping entry).
Command-line values always win over the config file.

Dashboard and slideshow inputs may also carry a config.{csv,xls,xlsx} file at
their root; it is layered below --config.

Re-running over an unchanged input does no work: outputs carry the
modification time of their sources.")]
#[command(version = version_string())]
struct Cli {
    /// Input folder
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Output folder
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Config file (.csv, .xls, .xlsx, .yaml, .yml or .toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by commands that convert documents.
#[derive(clap::Args, Clone, Default)]
struct DocumentArgs {
    /// Prefix for relative image links in converted documents
    #[arg(long)]
    base_url: Option<String>,

    /// Front-matter key kept from converted documents (repeatable)
    #[arg(long = "front-matter-field")]
    front_matter_fields: Vec<String>,

    /// Pandoc output format
    #[arg(long)]
    dialect: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Build dashboard rows from a tree of links, icons and images
    Dashboard {
        /// Target static site generator (hugo, eleventy)
        #[arg(long)]
        generator: Option<Generator>,
        /// Columns per row
        #[arg(long)]
        grid_width: Option<u32>,
        /// Column widths per item kind (uniform, sized)
        #[arg(long)]
        width_policy: Option<WidthPolicy>,
        /// Whether an empty titled folder still emits a row (emit, skip)
        #[arg(long)]
        empty_rows: Option<EmptyRowPolicy>,
    },
    /// Normalise a folder of images and videos into a slideshow page
    Slideshow {
        /// Block width ratio
        #[arg(long)]
        width: Option<u32>,
        /// Block height ratio
        #[arg(long)]
        height: Option<u32>,
        /// Pad videos to the block ratio (true, false)
        #[arg(long)]
        process_video: Option<bool>,
    },
    /// Convert a document tree to Markdown and run configured operations
    Docs {
        #[command(flatten)]
        document: DocumentArgs,
        /// Folder for listFiles output (defaults to --output)
        #[arg(long)]
        data: Option<PathBuf>,
        /// Folder copied into the output before conversion
        #[arg(long)]
        template: Option<PathBuf>,
    },
    /// Convert an FAQ folder: documents to Markdown, videos to square thumbnails
    Faq {
        #[command(flatten)]
        document: DocumentArgs,
    },
}

impl Command {
    fn reads_tree_config(&self) -> bool {
        matches!(self, Command::Dashboard { .. } | Command::Slideshow { .. })
    }
}

impl DocumentArgs {
    fn apply(&self, layer: &mut ConfigFile) {
        layer.base_url = self.base_url.clone();
        if !self.front_matter_fields.is_empty() {
            layer.valid_front_matter_fields = Some(self.front_matter_fields.clone());
        }
        layer.markdown_dialect = self.dialect.clone();
    }
}

impl Cli {
    /// The command line as the topmost config layer.
    fn command_layer(&self) -> ConfigFile {
        let mut layer = ConfigFile {
            input: self.input.clone(),
            output: self.output.clone(),
            ..Default::default()
        };
        match &self.command {
            Command::Dashboard {
                generator,
                grid_width,
                width_policy,
                empty_rows,
            } => {
                layer.generator = *generator;
                layer.grid_width = *grid_width;
                layer.width_policy = *width_policy;
                layer.empty_rows = *empty_rows;
            }
            Command::Slideshow {
                width,
                height,
                process_video,
            } => {
                layer.width = *width;
                layer.height = *height;
                layer.process_video = *process_video;
            }
            Command::Docs {
                document,
                data,
                template,
            } => {
                document.apply(&mut layer);
                layer.data = data.clone();
                layer.template = template.clone();
            }
            Command::Faq { document } => document.apply(&mut layer),
        }
        layer
    }

    /// Command line over `--config` over the input tree's own config file.
    fn resolve_settings(&self) -> Result<Settings, config::ConfigError> {
        let mut layers = self.command_layer();
        if let Some(path) = &self.config {
            layers = layers.layered_over(ConfigFile::load(path)?);
        }
        if self.command.reads_tree_config()
            && let Some(input) = layers.input.clone()
            && input.is_dir()
            && let Some(tree) = config::find_tree_config(&input)?
        {
            tracing::info!(config = %tree.display(), "using config from input tree");
            layers = layers.layered_over(ConfigFile::load(&tree)?);
        }
        Settings::resolve(layers)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docs_to_markdown=info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = match cli.resolve_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    match &cli.command {
        Command::Dashboard { .. } => {
            println!("==> Dashboard {} → {}", settings.input.display(), settings.output.display());
            let result = dashboard::generate(
                &settings.input,
                &settings.output,
                &DashboardOptions::from(&settings),
                &RustBackend::new(),
            )?;
            output::print_dashboard_output(&result);
        }
        Command::Slideshow { .. } => {
            println!("==> Slideshow {} → {}", settings.input.display(), settings.output.display());
            let result = slideshow::generate(
                &settings.input,
                &settings.output,
                &SlideshowOptions::from(&settings),
                &RustBackend::new(),
                &FfmpegBackend::new(),
                &chrono::Local::now(),
            )?;
            output::print_slideshow_output(&result);
        }
        Command::Docs { .. } => {
            println!("==> Docs {} → {}", settings.input.display(), settings.output.display());
            let converter = Pandoc::new().with_dialect(settings.markdown_dialect.as_str());
            let report = docs::convert_tree(&settings.input, &DocsOptions::from(&settings), &converter)?;
            output::print_run_report(&report);
        }
        Command::Faq { .. } => {
            println!("==> FAQ {} → {}", settings.input.display(), settings.output.display());
            let converter = Pandoc::new().with_dialect(settings.markdown_dialect.as_str());
            let report = faq::convert_folder(
                &settings.input,
                &settings.output,
                &settings.document_options(),
                &converter,
                &FfmpegBackend::new(),
            )?;
            output::print_run_report(&report);
        }
    }

    Ok(())
}
