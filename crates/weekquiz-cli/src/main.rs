use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use weekquiz_core::config_file::{self, ConfigFile};
use weekquiz_core::{ShortPoolPolicy, read_dataset};
use weekquiz_ingest::{PdfOptions, PipelineOptions, SourceKind};
use weekquiz_parsing::HarvestConfigBuilder;

mod output;

use output::ColorMode;

const DEFAULT_OUTPUT: &str = "quiz_data.json";

/// Weekly Quiz Builder - Turn PDF notes or question collections into a 12-week quiz dataset
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Harvest questions from a PDF, text, or JSON file and write the quiz dataset
    Build {
        /// Path to the source document
        input: PathBuf,

        /// How to read the input (auto picks by file extension)
        #[arg(long, value_enum, default_value_t = KindArg::Auto)]
        kind: KindArg,

        /// Where to write the dataset (default: quiz_data.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// What to do when fewer questions than the grid needs are found
        #[arg(long, value_enum)]
        on_short_pool: Option<ShortPoolArg>,

        /// Keep text-path questions that have no recognizable answer
        #[arg(long)]
        keep_unanswered: bool,

        /// Harvest and print the question pool without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Also write logs to this file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Verify an emitted dataset and print its summary
    Inspect {
        /// Path to a quiz dataset JSON file
        dataset: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Auto,
    Pdf,
    Text,
    Records,
}

impl KindArg {
    fn source_kind(self) -> Option<SourceKind> {
        match self {
            KindArg::Auto => None,
            KindArg::Pdf => Some(SourceKind::Pdf),
            KindArg::Text => Some(SourceKind::Text),
            KindArg::Records => Some(SourceKind::Records),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ShortPoolArg {
    /// Pad with marked duplicates
    Pad,
    /// Refuse to build
    Fail,
}

impl From<ShortPoolArg> for ShortPoolPolicy {
    fn from(arg: ShortPoolArg) -> Self {
        match arg {
            ShortPoolArg::Pad => ShortPoolPolicy::PadWithMarkedDuplicates,
            ShortPoolArg::Fail => ShortPoolPolicy::Fail,
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            input,
            kind,
            output,
            on_short_pool,
            keep_unanswered,
            dry_run,
            no_color,
            log_file,
        } => {
            let _guard = init_logging(log_file.as_deref())?;
            let config = config_file::load_config();
            let options = pipeline_options(&config, kind, on_short_pool, keep_unanswered)?;
            let color = ColorMode(!no_color);
            if dry_run {
                dry_run_build(&input, &options, color)
            } else {
                let output = resolve_output(output, &config);
                build(&input, &output, &options, color)
            }
        }
        Command::Inspect { dataset, no_color } => {
            let _guard = init_logging(None)?;
            let marker = config_file::load_config()
                .pagination_config()
                .variation_marker;
            inspect(&dataset, &marker, ColorMode(!no_color))
        }
    }
}

/// Install the stderr subscriber, plus a file layer when `log_file` is set.
/// The returned guard must live until the process exits so buffered file
/// output is flushed.
fn init_logging(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .with_context(|| format!("log file path has no file name: {}", path.display()))?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();
    Ok(Some(guard))
}

/// Resolve configuration: CLI flags > config file > defaults.
fn pipeline_options(
    config: &ConfigFile,
    kind: KindArg,
    on_short_pool: Option<ShortPoolArg>,
    keep_unanswered: bool,
) -> anyhow::Result<PipelineOptions> {
    let mut pagination = config.pagination_config();
    if let Some(policy) = on_short_pool {
        pagination.on_short_pool = policy.into();
    }

    let require_answer = if keep_unanswered {
        false
    } else {
        config.require_answer().unwrap_or(true)
    };
    let patterns = config.harvest_section();
    let mut builder = HarvestConfigBuilder::new().require_answer(require_answer);
    if let Some(list) = patterns.question_patterns {
        builder = builder.question_patterns(list);
    }
    if let Some(list) = patterns.answer_patterns {
        builder = builder.answer_patterns(list);
    }
    let harvest = builder
        .extra_question_patterns(patterns.extra_question_patterns.unwrap_or_default())
        .extra_answer_patterns(patterns.extra_answer_patterns.unwrap_or_default())
        .build()
        .context("invalid pattern in [harvest] config")?;

    let margins = config.pdf_section();
    Ok(PipelineOptions {
        kind: kind.source_kind(),
        harvest,
        pagination,
        pdf: PdfOptions {
            header_exclusion: margins.header_exclusion,
            footer_exclusion: margins.footer_exclusion,
        },
    })
}

/// Output path: CLI flag > WEEKQUIZ_OUTPUT > config file > default.
fn resolve_output(flag: Option<PathBuf>, config: &ConfigFile) -> PathBuf {
    flag.or_else(|| std::env::var("WEEKQUIZ_OUTPUT").ok().map(PathBuf::from))
        .or_else(|| config.output_path())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn build(
    input: &Path,
    output_path: &Path,
    options: &PipelineOptions,
    color: ColorMode,
) -> anyhow::Result<()> {
    let mut writer = std::io::stdout();
    let kind = options.kind_for(input);
    output::print_build_start(&mut writer, &display_name(input), kind, color)?;

    let dataset = weekquiz_ingest::build_and_write(input, output_path, options)
        .with_context(|| format!("no dataset written for {}", input.display()))?;

    let variations = dataset.count_marked(&options.pagination.variation_marker);
    output::print_build_summary(&mut writer, &dataset, variations, output_path, color)?;
    output::print_preview(&mut writer, &dataset, color)?;
    writer.flush()?;
    Ok(())
}

fn dry_run_build(input: &Path, options: &PipelineOptions, color: ColorMode) -> anyhow::Result<()> {
    let mut writer = std::io::stdout();
    let pool = weekquiz_ingest::load_pool(input, options)
        .with_context(|| format!("failed to harvest {}", input.display()))?;
    output::print_pool(&mut writer, &display_name(input), &pool, color)?;
    writer.flush()?;
    Ok(())
}

fn inspect(path: &Path, marker: &str, color: ColorMode) -> anyhow::Result<()> {
    let dataset =
        read_dataset(path).with_context(|| format!("failed to load {}", path.display()))?;
    let mut writer = std::io::stdout();

    if let Err(violation) = dataset.check_invariants() {
        anyhow::bail!("{} is inconsistent: {}", path.display(), violation);
    }

    let variations = dataset.count_marked(marker);
    output::print_build_summary(&mut writer, &dataset, variations, path, color)?;
    output::print_preview(&mut writer, &dataset, color)?;
    writer.flush()?;
    Ok(())
}
