// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info};
use std::io::Write;
use std::path::PathBuf;

use talkalign::app_config::{self, AlignerBackend, Config, DefaultQuota, MissingLanguagePolicy};
use talkalign::app_controller::{Controller, RunSummary, StopReason};
use talkalign::corpus::SchemaMapping;

/// CLI Wrapper for AlignerBackend to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliAlignerBackend {
    Http,
    Mock,
}

impl From<CliAlignerBackend> for AlignerBackend {
    fn from(cli_backend: CliAlignerBackend) -> Self {
        match cli_backend {
            CliAlignerBackend::Http => AlignerBackend::Http,
            CliAlignerBackend::Mock => AlignerBackend::Mock,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Align the units of an input store into an output store (default command)
    Align(AlignArgs),

    /// Show how many units an output store already holds
    Status {
        /// Output store to inspect
        #[arg(value_name = "OUTPUT_PATH")]
        output_path: PathBuf,

        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,
    },

    /// Generate shell completions for talkalign
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone)]
struct AlignArgs {
    /// Input JSON-lines store of talks
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Output JSON-lines store of aligned pairs
    #[arg(value_name = "OUTPUT_PATH")]
    output_path: PathBuf,

    #[command(flatten)]
    options: AlignOptions,
}

#[derive(clap::Args, Debug, Clone)]
struct AlignOptions {
    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Number of units to newly complete in this run
    #[arg(short = 'n', long, conflicts_with = "unbounded")]
    quota: Option<usize>,

    /// Process every remaining unit
    #[arg(long)]
    unbounded: bool,

    /// Leading input records to skip
    #[arg(short, long)]
    offset: Option<usize>,

    /// Carry the categorical attribute into the output records
    #[arg(long)]
    include_attribute: bool,

    /// Field layout of the input records ('transcripts' or 'transcript')
    #[arg(long)]
    schema: Option<String>,

    /// Skip units lacking a language instead of failing the run
    #[arg(long)]
    skip_missing: bool,

    /// Aligner backend to use
    #[arg(short, long, value_enum)]
    aligner: Option<CliAlignerBackend>,

    /// Alignment service URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// talkalign - resumable parallel-corpus alignment
///
/// Reads multilingual talk transcripts, aligns each talk's source and target
/// documents at the sentence level, and appends the pairs to an output store
/// that can be resumed at any point.
#[derive(Parser, Debug)]
#[command(name = "talkalign")]
#[command(version)]
#[command(about = "Resumable sentence alignment of multilingual talk transcripts")]
#[command(long_about = "talkalign aligns the source and target transcripts of each talk and appends
the sentence pairs to a JSON-lines output store. Rerunning against the same
output store continues where the previous run stopped.

EXAMPLES:
    talkalign talks.jsonl pairs.jsonl                 # Align using default config
    talkalign -s en -t fr talks.jsonl pairs.jsonl     # Align English to French
    talkalign -n 50 talks.jsonl pairs.jsonl           # Complete 50 more talks
    talkalign --unbounded talks.jsonl pairs.jsonl     # Complete every remaining talk
    talkalign -o 1000 talks.jsonl pairs.jsonl         # Skip the first 1000 records
    talkalign -a mock talks.jsonl pairs.jsonl         # Dry run with positional pairing
    talkalign status pairs.jsonl                      # Show store progress
    talkalign completions bash > talkalign.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically.")]
#[command(args_conflicts_with_subcommands = true)]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input JSON-lines store of talks
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output JSON-lines store of aligned pairs
    #[arg(value_name = "OUTPUT_PATH")]
    output_path: Option<PathBuf>,

    #[command(flatten)]
    options: AlignOptions,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Prefix and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "\x1B[1;31m"),
            Level::Warn => ("WARN ", "\x1B[1;33m"),
            Level::Info => ("INFO ", "\x1B[1;32m"),
            Level::Debug => ("DEBUG", "\x1B[1;36m"),
            Level::Trace => ("TRACE", "\x1B[1;35m"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (prefix, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, prefix, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize with the most verbose level; the effective level is set
    // through log::set_max_level once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    let result = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "talkalign", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Status {
            output_path,
            config_path,
        }) => run_status(output_path, &config_path),
        Some(Commands::Align(args)) => run_align(args).await,
        None => {
            // Default behavior: top-level args are an implicit `align`
            match (cli.input_path, cli.output_path) {
                (Some(input_path), Some(output_path)) => {
                    run_align(AlignArgs {
                        input_path,
                        output_path,
                        options: cli.options,
                    })
                    .await
                }
                _ => Err(anyhow!(
                    "INPUT_PATH and OUTPUT_PATH are required when no subcommand is specified"
                )),
            }
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

/// Apply command line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, options: &AlignOptions) -> Result<()> {
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(quota) = options.quota {
        config.unit_quota = Some(quota);
    }
    if options.unbounded {
        config.unit_quota = None;
        config.default_quota = DefaultQuota::Unbounded;
    }
    if let Some(offset) = options.offset {
        config.offset = offset;
    }
    if options.include_attribute {
        config.include_attribute = true;
    }
    if let Some(name) = &options.schema {
        config.schema =
            SchemaMapping::preset(name).ok_or_else(|| anyhow!("Unknown schema preset: {}", name))?;
    }
    if options.skip_missing {
        config.on_missing_language = MissingLanguagePolicy::Skip;
    }
    if let Some(backend) = &options.aligner {
        config.aligner.backend = backend.clone().into();
    }
    if let Some(endpoint) = &options.endpoint {
        config.aligner.endpoint = endpoint.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
    Ok(())
}

async fn run_align(args: AlignArgs) -> Result<()> {
    let options = &args.options;
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let mut config = Config::load_or_create(&options.config_path)?;
    apply_overrides(&mut config, options)?;
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(level_filter(&config.log_level));

    let controller = Controller::with_config(config)?;
    let summary = controller
        .run(&args.input_path, &args.output_path)
        .await
        .context(format!(
            "Alignment of {} into {} failed",
            args.input_path.display(),
            args.output_path.display()
        ))?;

    print_summary(&summary);
    Ok(())
}

fn run_status(output_path: PathBuf, config_path: &str) -> Result<()> {
    let config = Config::load_or_create(config_path)?;
    log::set_max_level(level_filter(&config.log_level));

    let controller = Controller::with_config(config)?;
    let status = controller
        .status(&output_path)
        .context(format!("Failed to inspect {}", output_path.display()))?;

    println!("Output store:      {}", output_path.display());
    println!("Completed units:   {}", status.completed_units);
    println!("Records:           {}", status.record_count);
    if status.commit_log_present {
        println!("Commit markers:    {}", status.committed_markers);
        println!("Uncommitted bytes: {}", status.uncommitted_bytes);
    } else {
        println!("Commit markers:    none");
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let stop = match summary.stop_reason {
        StopReason::QuotaReached => "quota reached",
        StopReason::SourceExhausted => "input exhausted",
    };
    info!("Run {} stopped: {}", summary.run_id, stop);
    println!("Units completed:          {}", summary.units_completed);
    println!("Pairs written:            {}", summary.pairs_written);
    println!("Previously completed:     {}", summary.previously_completed);
    println!("Skipped before offset:    {}", summary.skipped_before_offset);
    println!("Skipped as completed:     {}", summary.skipped_completed);
    println!("Skipped missing language: {}", summary.skipped_missing_language.len());
    if !summary.recovery.is_clean() {
        println!(
            "Recovered:                {} orphaned bytes, {} torn marker bytes",
            summary.recovery.orphaned_bytes, summary.recovery.torn_marker_bytes
        );
    }
    println!("Elapsed:                  {}", Controller::format_duration(summary.elapsed));
}
