// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, info};
use std::io::Write;
use std::path::PathBuf;

use doctranslate::app_config::{self, Config};
use doctranslate::app_controller::Controller;

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
    /// Translate a document (default command)
    #[command(alias = "translate")]
    Run(RunArgs),

    /// Generate shell completions for doctranslate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by the bare and the `run` form
#[derive(Args, Debug, Clone)]
struct RunOptions {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", default_value = "conf.json")]
    config_path: String,

    /// Translate with the local model only
    #[arg(long)]
    local: bool,

    /// Number of fragments translated concurrently
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Maximum backend requests per second
    #[arg(long, value_name = "RATE")]
    rate: Option<f64>,

    /// Attempts against the online backend before falling back
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Document to translate (.pptx, .docx, .xlsx, .pdf or .doc)
    #[arg(value_name = "INPUT_FILE")]
    input_file: PathBuf,

    /// Target language code (e.g., 'de', 'fr', 'pt')
    #[arg(value_name = "TARGET_LANGUAGE")]
    target_language: String,

    /// Output file, derived from the input file when omitted
    #[arg(value_name = "OUTPUT_FILE")]
    output_file: Option<PathBuf>,

    #[command(flatten)]
    options: RunOptions,
}

/// doctranslate - translate office documents
#[derive(Parser, Debug)]
#[command(name = "doctranslate")]
#[command(version)]
#[command(about = "Translate PPTX, DOCX, XLSX, PDF and DOC files")]
#[command(long_about = "doctranslate translates the text of office documents with DeepL or Google Translate, \
falling back to a local model when the online service gives up.

EXAMPLES:
    doctranslate slides.pptx de                     # Writes slides_translated.pptx
    doctranslate run report.docx fr out/report.docx # Explicit output file
    doctranslate paper.pdf en                       # Writes paper_translated.txt
    doctranslate --local budget.xlsx es             # Local model only
    doctranslate completions bash > doctranslate.bash

ENVIRONMENT:
    DEEPL_API_KEY      Use DeepL instead of Google Translate when set
    LOCAL_TRANSLATION  'true' selects local-only translation

A .env file in the working directory is read before the environment.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Document to translate (.pptx, .docx, .xlsx, .pdf or .doc)
    #[arg(value_name = "INPUT_FILE")]
    input_file: Option<PathBuf>,

    /// Target language code (e.g., 'de', 'fr', 'pt')
    #[arg(value_name = "TARGET_LANGUAGE")]
    target_language: Option<String>,

    /// Output file, derived from the input file when omitted
    #[arg(value_name = "OUTPUT_FILE")]
    output_file: Option<PathBuf>,

    #[command(flatten)]
    options: RunOptions,
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

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
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
            let emoji = Self::get_emoji_for_level(record.level());
            let color = Self::get_color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

// @converts: Config log level to a log filter
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
    // The logger accepts everything; log::set_max_level does the filtering
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = match CommandLineOptions::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            std::process::exit(code);
        }
    };

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "doctranslate", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Run(args)) => run_translate(args).await,
        None => {
            // Bare form: doctranslate <INPUT_FILE> <TARGET_LANGUAGE> [OUTPUT_FILE]
            let (Some(input_file), Some(target_language)) = (cli.input_file, cli.target_language) else {
                eprintln!("Usage: doctranslate [run] <INPUT_FILE> <TARGET_LANGUAGE> [OUTPUT_FILE]");
                std::process::exit(1);
            };

            let run_args = RunArgs {
                input_file,
                target_language,
                output_file: cli.output_file,
                options: cli.options,
            };
            run_translate(run_args).await
        }
    }
}

async fn run_translate(args: RunArgs) -> Result<()> {
    let options = &args.options;

    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&level));
    }

    if let Ok(path) = dotenv::dotenv() {
        debug!("Loaded environment from {}", path.display());
    }

    let mut config = Config::load(&options.config_path)
        .with_context(|| format!("Failed to load configuration from {}", options.config_path))?;
    config.translation.apply_env_overrides(|key| std::env::var(key).ok());

    // Command line overrides
    if options.local {
        config.translation.local_only = true;
    }
    if let Some(concurrency) = options.concurrency {
        config.translation.concurrent_requests = concurrency;
    }
    if let Some(rate) = options.rate {
        config.translation.requests_per_second = rate;
    }
    if let Some(retries) = options.retries {
        config.translation.max_retries = retries;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(level_filter(&config.log_level));
    }

    config.validate().context("Configuration validation failed")?;

    let mut controller = Controller::with_config(config)?;
    if options.no_progress {
        controller = controller.quiet();
    }

    let report = controller
        .run(&args.input_file, &args.target_language, args.output_file.as_deref())
        .await?;

    info!(
        "{}: {} translated, {} failed",
        report.output.display(),
        report.translated,
        report.failed()
    );
    Ok(())
}
