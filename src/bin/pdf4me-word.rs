//! CLI binary for pdf4me-word.
//!
//! A thin shim over the library crate: maps subcommands to typed operations,
//! runs them (one directly, several as a batch) and saves the results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pdf4me_word::config::DEFAULT_BASE_URL;
use pdf4me_word::{
    run_batch, run_operation_with_cancel, write_outputs, AddImageWatermark, AddTextWatermark,
    ClientConfig, CompareDocuments, ComplianceLevel, DeletePages, DelayStrategy, DocumentSource,
    ExtractMetadata, FormatMode, HeaderFooterContent, JobProgressCallback, MergeDocuments,
    Operation, OperationOutput, OptimizationLevel, OptimizeDocument, Pdf4meClient,
    ProgressCallback, ProtectionType, ReplaceText, ReplaceTextWithImage, SecureDocument,
    SplitDocument, SplitType, TextFormatting, UpdateHeadersFooters, UpdateToc,
    WatermarkOrientation,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Spinner for a single job; switches to a counted bar when a batch starts.
struct CliProgressCallback {
    bar: ProgressBar,
    failures: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Working");
        bar.set_message("Preparing documents…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            failures: AtomicUsize::new(0),
        })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// `/office/ApiV2Word/SplitDocument` → `SplitDocument`.
fn short_name(endpoint: &str) -> &str {
    endpoint.rsplit('/').next().unwrap_or(endpoint)
}

impl JobProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_items: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} items  \
                 ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_length(total_items as u64);
        self.bar.set_prefix("Processing");
    }

    fn on_job_submitted(&self, endpoint: &str) {
        self.bar
            .set_message(format!("{} submitted", short_name(endpoint)));
    }

    fn on_job_deferred(&self, endpoint: &str, _location: &str) {
        self.bar
            .set_message(format!("{} queued on server", short_name(endpoint)));
    }

    fn on_poll_attempt(&self, endpoint: &str, attempt: u32, max_attempts: u32) {
        self.bar.set_message(format!(
            "{} processing {}",
            short_name(endpoint),
            dim(&format!("(poll {attempt}/{max_attempts})"))
        ));
    }

    fn on_job_complete(&self, endpoint: &str, attempts: u32) {
        self.bar.println(format!(
            "  {} {:<24} {}",
            green("✓"),
            short_name(endpoint),
            dim(&format!("{attempts} poll(s)"))
        ));
        self.bar.inc(1);
    }

    fn on_job_error(&self, endpoint: &str, error: &str) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<24} {}",
            red("✗"),
            short_name(endpoint),
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_items: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_items.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} item(s) processed successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} item(s) processed  ({} failed)",
                red("✘"),
                bold(&success_count.to_string()),
                total_items,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Watermark a local document
  pdf4me-word text-watermark -i contract.docx --text DRAFT

  # Several documents at once (runs as a batch)
  pdf4me-word optimize -i a.docx -i b.docx -i c.docx --level high -o out/

  # Document from a URL
  pdf4me-word metadata -i https://example.com/report.docx

  # Compare two revisions
  pdf4me-word compare -i v1.docx --with v2.docx --ignore-formatting

  # Merge
  pdf4me-word merge -i cover.docx -i body.docx -i appendix.docx --output-name book.docx

  # Split by page ranges
  pdf4me-word split -i book.docx --split-type pages --page-ranges "1-3,4-10"

ENVIRONMENT VARIABLES:
  PDF4ME_API_KEY   API key (sent as a Basic token)
  PDF4ME_BASE_URL  Override the service root (default https://api.pdf4me.com)
  RUST_LOG         Override the log filter (e.g. pdf4me_word=debug)
"#;

/// Run PDF4me Word actions from the command line.
#[derive(Parser, Debug)]
#[command(
    name = "pdf4me-word",
    version,
    about = "Run PDF4me Word document actions from the command line",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// PDF4me API key.
    #[arg(long, env = "PDF4ME_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Service root URL.
    #[arg(long, env = "PDF4ME_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Give up on a deferred job after this many polls.
    #[arg(long, default_value_t = 9000, global = true)]
    max_poll_attempts: u32,

    /// Sleep locally this many seconds between polls instead of calling the
    /// service's delay endpoint.
    #[arg(long, value_name = "SECS", global = true)]
    local_delay: Option<u64>,

    /// Documents processed at the same time when several inputs are given.
    #[arg(short, long, default_value_t = 4, global = true)]
    concurrency: usize,

    /// Keep going when one of several inputs fails.
    #[arg(long, global = true)]
    continue_on_fail: bool,

    /// Directory produced documents are written to.
    #[arg(short, long, default_value = ".", global = true)]
    output_dir: PathBuf,

    /// Print the JSON summary of each operation on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Disable progress display.
    #[arg(long, global = true)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Primary document(s) of an operation.
#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// Local path or http(s) URL. Repeat to process several documents.
    #[arg(
        short = 'i',
        long = "input",
        value_name = "PATH|URL",
        required_unless_present = "input_base64"
    )]
    inputs: Vec<String>,

    /// Inline base64 document (a `data:...;base64,` prefix is accepted).
    #[arg(long, value_name = "BASE64", conflicts_with = "inputs")]
    input_base64: Option<String>,

    /// File name sent along with --input-base64.
    #[arg(long, requires = "input_base64")]
    input_name: Option<String>,

    /// Name of the produced file (single input only).
    #[arg(long)]
    output_name: Option<String>,
}

impl InputArgs {
    fn sources(&self) -> Vec<DocumentSource> {
        match &self.input_base64 {
            Some(content) => vec![DocumentSource::Base64 {
                content: content.clone(),
                file_name: self.input_name.clone(),
            }],
            None => self.inputs.iter().map(|s| DocumentSource::from_arg(s)).collect(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stamp a text watermark on every page.
    TextWatermark {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = "CONFIDENTIAL")]
        text: String,
        #[arg(long, default_value = "Arial")]
        font_family: String,
        #[arg(long, default_value_t = 72)]
        font_size: u32,
        /// Hex colour, #RRGGBB.
        #[arg(long, default_value = "#808080")]
        color: String,
        /// Degrees.
        #[arg(long, default_value_t = 45)]
        rotation: i32,
        #[arg(long, value_enum, default_value = "diagonal")]
        orientation: OrientationArg,
        /// Draw the watermark fully opaque.
        #[arg(long)]
        opaque: bool,
    },
    /// Place an image watermark on every page.
    ImageWatermark {
        #[command(flatten)]
        input: InputArgs,
        /// Watermark image (path or URL).
        #[arg(long, value_name = "PATH|URL")]
        image: String,
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        #[arg(long)]
        semi_transparent: bool,
    },
    /// Print document properties as JSON.
    Metadata {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Reduce document size.
    Optimize {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_enum, default_value = "medium")]
        level: LevelArg,
    },
    /// Compare against a revised version; the result carries tracked changes.
    Compare {
        #[command(flatten)]
        input: InputArgs,
        /// Revised document (path or URL).
        #[arg(long = "with", value_name = "PATH|URL")]
        revised: String,
        #[arg(long)]
        ignore_formatting: bool,
        #[arg(long)]
        ignore_case: bool,
        #[arg(long)]
        ignore_comments: bool,
        #[arg(long)]
        ignore_tables: bool,
        #[arg(long)]
        ignore_fields: bool,
        #[arg(long)]
        ignore_footnotes: bool,
        #[arg(long)]
        ignore_textboxes: bool,
        #[arg(long)]
        ignore_headers_and_footers: bool,
        #[arg(long, default_value = "System Comparison")]
        author: String,
    },
    /// Split into several documents.
    Split {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_enum, default_value = "pages")]
        split_type: SplitTypeArg,
        /// e.g. "1-3,4-10" (pages/custom splits only).
        #[arg(long)]
        page_ranges: Option<String>,
    },
    /// Merge two or more documents into one.
    Merge {
        /// Documents in merge order (path or URL); at least two.
        #[arg(short = 'i', long = "input", value_name = "PATH|URL", required = true)]
        inputs: Vec<String>,
        #[arg(long, value_enum, default_value = "keep-source-formatting")]
        format_mode: FormatModeArg,
        #[arg(long, value_enum, default_value = "transitional")]
        compliance: ComplianceArg,
        #[arg(long)]
        output_name: Option<String>,
    },
    /// Password-protect a document.
    Secure {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, env = "PDF4ME_DOC_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, value_enum, default_value = "read-only")]
        protection: ProtectionArg,
    },
    /// Delete pages.
    DeletePages {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        start: Option<u32>,
        #[arg(long)]
        end: Option<u32>,
        /// e.g. "1,3,5-7".
        #[arg(long)]
        pages: Option<String>,
    },
    /// Refresh the table of contents.
    UpdateToc {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=9))]
        max_heading_level: u8,
        #[arg(long)]
        no_page_numbers: bool,
        #[arg(long, default_value = "Dots")]
        tab_leader: String,
    },
    /// Find and replace text.
    ReplaceText {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        search: String,
        #[arg(long)]
        replace: String,
        #[arg(long)]
        match_case: bool,
        #[arg(long)]
        whole_word: bool,
        #[arg(long)]
        regex: bool,
        #[arg(long)]
        bold: bool,
        #[arg(long)]
        italic: bool,
        #[arg(long)]
        underline: bool,
        #[arg(long)]
        font_name: Option<String>,
        #[arg(long)]
        font_size: Option<u32>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Replace a text marker with an image.
    ReplaceTextWithImage {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_name = "PATH|URL")]
        image: String,
        #[arg(long)]
        find_text: Option<String>,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// all, first, last, odd, even or specific.
        #[arg(long, default_value = "all")]
        apply_to: String,
        #[arg(long)]
        page_numbers: Option<String>,
        #[arg(long)]
        ignore_page_numbers: Option<String>,
        #[arg(long)]
        skip_first_page: bool,
    },
    /// Replace headers and footers (HTML or plain text).
    HeadersFooters {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        header: Option<String>,
        #[arg(long)]
        footer: Option<String>,
        #[arg(long)]
        first_page_header: Option<String>,
        #[arg(long)]
        first_page_footer: Option<String>,
        #[arg(long)]
        even_pages_header: Option<String>,
        #[arg(long)]
        even_pages_footer: Option<String>,
        #[arg(long)]
        odd_pages_header: Option<String>,
        #[arg(long)]
        odd_pages_footer: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OrientationArg {
    Horizontal,
    Vertical,
    Diagonal,
    UpsideDown,
}

impl From<OrientationArg> for WatermarkOrientation {
    fn from(v: OrientationArg) -> Self {
        match v {
            OrientationArg::Horizontal => WatermarkOrientation::Horizontal,
            OrientationArg::Vertical => WatermarkOrientation::Vertical,
            OrientationArg::Diagonal => WatermarkOrientation::Diagonal,
            OrientationArg::UpsideDown => WatermarkOrientation::UpsideDown,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LevelArg {
    Low,
    Medium,
    High,
}

impl From<LevelArg> for OptimizationLevel {
    fn from(v: LevelArg) -> Self {
        match v {
            LevelArg::Low => OptimizationLevel::Low,
            LevelArg::Medium => OptimizationLevel::Medium,
            LevelArg::High => OptimizationLevel::High,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SplitTypeArg {
    Pages,
    Sections,
    Headings,
    Custom,
}

impl From<SplitTypeArg> for SplitType {
    fn from(v: SplitTypeArg) -> Self {
        match v {
            SplitTypeArg::Pages => SplitType::Pages,
            SplitTypeArg::Sections => SplitType::Sections,
            SplitTypeArg::Headings => SplitType::Headings,
            SplitTypeArg::Custom => SplitType::Custom,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatModeArg {
    KeepSourceFormatting,
    KeepDifferentStyles,
    UseDestinationStyles,
}

impl From<FormatModeArg> for FormatMode {
    fn from(v: FormatModeArg) -> Self {
        match v {
            FormatModeArg::KeepSourceFormatting => FormatMode::KeepSourceFormatting,
            FormatModeArg::KeepDifferentStyles => FormatMode::KeepDifferentStyles,
            FormatModeArg::UseDestinationStyles => FormatMode::UseDestinationStyles,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ComplianceArg {
    Ecma,
    Transitional,
    Strict,
    Custom,
}

impl From<ComplianceArg> for ComplianceLevel {
    fn from(v: ComplianceArg) -> Self {
        match v {
            ComplianceArg::Ecma => ComplianceLevel::Ecma,
            ComplianceArg::Transitional => ComplianceLevel::Transitional,
            ComplianceArg::Strict => ComplianceLevel::Strict,
            ComplianceArg::Custom => ComplianceLevel::Custom,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ProtectionArg {
    ReadOnly,
    CommentsOnly,
    FormsOnly,
    TrackedChanges,
}

impl From<ProtectionArg> for ProtectionType {
    fn from(v: ProtectionArg) -> Self {
        match v {
            ProtectionArg::ReadOnly => ProtectionType::ReadOnly,
            ProtectionArg::CommentsOnly => ProtectionType::CommentsOnly,
            ProtectionArg::FormsOnly => ProtectionType::FormsOnly,
            ProtectionArg::TrackedChanges => ProtectionType::TrackedChanges,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress display replaces INFO logs; --verbose brings them back.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build operations ─────────────────────────────────────────────────
    let operations = build_operations(&cli.command)?;

    // ── Build client ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress
            .clone()
            .map(|cb| cb as Arc<dyn JobProgressCallback>),
    )?;
    let client = Pdf4meClient::new(config).context("Failed to create HTTP client")?;

    // Ctrl-C aborts the jobs at their next request or wait.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    // ── Run ──────────────────────────────────────────────────────────────
    if let [operation] = operations.as_slice() {
        let result = run_operation_with_cancel(&client, operation, &cancel).await;
        if let Some(ref cb) = progress {
            cb.finish();
        }
        report(&cli, &result?).await?;
        return Ok(());
    }

    let total = operations.len();
    let results = run_batch(&client, &operations, cli.continue_on_fail, &cancel).await?;
    let mut failed = 0usize;
    for item in results {
        match item.result {
            Ok(output) => report(&cli, &output).await?,
            Err(e) => {
                failed += 1;
                if progress.is_none() && !cli.quiet {
                    eprintln!("{} item {}: {e}", red("✗"), item.index + 1);
                }
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {total} item(s) failed");
    }
    Ok(())
}

/// Map global flags to `ClientConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .api_key(cli.api_key.clone().unwrap_or_default())
        .base_url(cli.base_url.clone())
        .max_poll_attempts(cli.max_poll_attempts)
        .concurrency(cli.concurrency);
    if let Some(secs) = cli.local_delay {
        builder = builder.delay(DelayStrategy::Local(Duration::from_secs(secs)));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder
        .build()
        .context("Invalid configuration (is PDF4ME_API_KEY set?)")
}

/// Save the produced documents and print what happened.
async fn report(cli: &Cli, output: &OperationOutput) -> Result<()> {
    let paths = write_outputs(&cli.output_dir, output)
        .await
        .context("Failed to save output")?;

    if cli.json {
        let mut json = output.json.clone();
        if let Some(map) = json.as_object_mut() {
            let saved: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
            map.insert("savedTo".into(), saved.into());
        }
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise output")?
        );
        return Ok(());
    }

    if output.documents.is_empty() {
        // Metadata: the JSON is the result.
        println!(
            "{}",
            serde_json::to_string_pretty(&output.json["metadata"])
                .context("Failed to serialise metadata")?
        );
    } else if !cli.quiet {
        for (path, doc) in paths.iter().zip(&output.documents) {
            println!(
                "{}  {}  {}",
                green("✔"),
                bold(&path.display().to_string()),
                dim(&format!("{} bytes", doc.size()))
            );
        }
    }
    Ok(())
}

/// One operation per primary input.
fn per_input(
    input: &InputArgs,
    build: impl Fn(DocumentSource, Option<String>) -> Operation,
) -> Result<Vec<Operation>> {
    let sources = input.sources();
    if sources.len() > 1 && input.output_name.is_some() {
        anyhow::bail!("--output-name can only be used with a single input");
    }
    Ok(sources
        .into_iter()
        .map(|source| build(source, input.output_name.clone()))
        .collect())
}

fn build_operations(command: &Command) -> Result<Vec<Operation>> {
    match command {
        Command::TextWatermark {
            input,
            text,
            font_family,
            font_size,
            color,
            rotation,
            orientation,
            opaque,
        } => per_input(input, |doc, output_name| {
            let mut op = AddTextWatermark::new(doc, text.clone());
            op.options.font_family = font_family.clone();
            op.options.font_size = *font_size;
            op.options.font_color = color.clone();
            op.options.rotation = *rotation;
            op.options.orientation = (*orientation).into();
            op.options.semi_transparent = !opaque;
            op.output_name = output_name;
            op.into()
        }),
        Command::ImageWatermark {
            input,
            image,
            scale,
            width,
            height,
            semi_transparent,
        } => per_input(input, |doc, output_name| {
            let mut op = AddImageWatermark::new(doc, DocumentSource::from_arg(image));
            op.options.scale = *scale;
            op.options.width = *width;
            op.options.height = *height;
            op.options.semi_transparent = *semi_transparent;
            op.output_name = output_name;
            op.into()
        }),
        Command::Metadata { input } => per_input(input, |doc, _| ExtractMetadata::new(doc).into()),
        Command::Optimize { input, level } => per_input(input, |doc, output_name| {
            let mut op = OptimizeDocument::new(doc);
            op.level = (*level).into();
            op.output_name = output_name;
            op.into()
        }),
        Command::Compare {
            input,
            revised,
            ignore_formatting,
            ignore_case,
            ignore_comments,
            ignore_tables,
            ignore_fields,
            ignore_footnotes,
            ignore_textboxes,
            ignore_headers_and_footers,
            author,
        } => per_input(input, |doc, output_name| {
            let mut op = CompareDocuments::new(doc, DocumentSource::from_arg(revised));
            op.options.ignore_formatting = *ignore_formatting;
            op.options.ignore_case = *ignore_case;
            op.options.ignore_comments = *ignore_comments;
            op.options.ignore_tables = *ignore_tables;
            op.options.ignore_fields = *ignore_fields;
            op.options.ignore_footnotes = *ignore_footnotes;
            op.options.ignore_textboxes = *ignore_textboxes;
            op.options.ignore_headers_and_footers = *ignore_headers_and_footers;
            op.options.author = author.clone();
            op.output_name = output_name;
            op.into()
        }),
        Command::Split {
            input,
            split_type,
            page_ranges,
        } => per_input(input, |doc, output_name| {
            let mut op = SplitDocument::new(doc, (*split_type).into());
            op.page_ranges = page_ranges.clone();
            op.output_name = output_name;
            op.into()
        }),
        Command::Merge {
            inputs,
            format_mode,
            compliance,
            output_name,
        } => {
            let mut op =
                MergeDocuments::new(inputs.iter().map(|s| DocumentSource::from_arg(s)).collect());
            op.format_mode = (*format_mode).into();
            op.compliance_level = (*compliance).into();
            op.output_name = output_name.clone();
            Ok(vec![op.into()])
        }
        Command::Secure {
            input,
            password,
            protection,
        } => per_input(input, |doc, output_name| {
            let mut op = SecureDocument::new(doc, password.clone());
            op.protection = (*protection).into();
            op.output_name = output_name;
            op.into()
        }),
        Command::DeletePages {
            input,
            start,
            end,
            pages,
        } => per_input(input, |doc, output_name| {
            let mut op = DeletePages::new(doc);
            op.start_page = *start;
            op.end_page = *end;
            op.page_numbers = pages.clone();
            op.output_name = output_name;
            op.into()
        }),
        Command::UpdateToc {
            input,
            max_heading_level,
            no_page_numbers,
            tab_leader,
        } => per_input(input, |doc, output_name| {
            let mut op = UpdateToc::new(doc);
            op.options.max_heading_level = *max_heading_level;
            op.options.include_page_numbers = !no_page_numbers;
            op.options.tab_leader = tab_leader.clone();
            op.output_name = output_name;
            op.into()
        }),
        Command::ReplaceText {
            input,
            search,
            replace,
            match_case,
            whole_word,
            regex,
            bold,
            italic,
            underline,
            font_name,
            font_size,
            color,
        } => {
            let styled = *bold
                || *italic
                || *underline
                || font_name.is_some()
                || font_size.is_some()
                || color.is_some();
            per_input(input, |doc, output_name| {
                let mut op = ReplaceText::new(doc, search.clone(), replace.clone());
                op.match_case = *match_case;
                op.match_whole_word = *whole_word;
                op.use_regex = *regex;
                op.formatting = styled.then(|| TextFormatting {
                    font_name: font_name.clone(),
                    font_size: *font_size,
                    bold: *bold,
                    italic: *italic,
                    underline: *underline,
                    color: color.clone(),
                });
                op.output_name = output_name;
                op.into()
            })
        }
        Command::ReplaceTextWithImage {
            input,
            image,
            find_text,
            width,
            height,
            apply_to,
            page_numbers,
            ignore_page_numbers,
            skip_first_page,
        } => per_input(input, |doc, output_name| {
            let mut op = ReplaceTextWithImage::new(doc, DocumentSource::from_arg(image));
            op.find_text = find_text.clone();
            op.width = *width;
            op.height = *height;
            op.apply_to = apply_to.clone();
            op.page_numbers = page_numbers.clone();
            op.ignore_page_numbers = ignore_page_numbers.clone();
            op.skip_first_page = *skip_first_page;
            op.output_name = output_name;
            op.into()
        }),
        Command::HeadersFooters {
            input,
            header,
            footer,
            first_page_header,
            first_page_footer,
            even_pages_header,
            even_pages_footer,
            odd_pages_header,
            odd_pages_footer,
        } => {
            let content = HeaderFooterContent {
                all_pages_header_html: header.clone(),
                all_pages_footer_html: footer.clone(),
                first_page_header_html: first_page_header.clone(),
                first_page_footer_html: first_page_footer.clone(),
                even_pages_header_html: even_pages_header.clone(),
                even_pages_footer_html: even_pages_footer.clone(),
                odd_pages_header_html: odd_pages_header.clone(),
                odd_pages_footer_html: odd_pages_footer.clone(),
            };
            per_input(input, |doc, output_name| {
                let mut op = UpdateHeadersFooters::new(doc, content.clone());
                op.output_name = output_name;
                op.into()
            })
        }
    }
}
