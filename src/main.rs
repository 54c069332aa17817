// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use app_controller::Controller;
use crate::app_config::Config;

mod app_config;
mod app_controller;
mod corpus;
mod errors;
mod file_utils;
mod language_utils;
mod pipeline;
mod progress;
mod providers;
mod translation;

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

fn to_level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synchronize target-locale corpora with the source corpus (default command)
    Sync(SyncArgs),

    /// Verify target-locale corpora without writing anything
    Verify(VerifyArgs),

    /// Generate shell completions for quizloc
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone)]
struct SyncArgs {
    /// Target locale to synchronize (default: every configured locale)
    #[arg(short, long)]
    locale: Option<String>,

    /// Only fix broken records (stubs, malformed blocks, previous failures)
    #[arg(short, long)]
    fix_only: bool,

    /// Verify only, write nothing
    #[arg(short, long)]
    verify_only: bool,

    /// Source corpus file (overrides config)
    #[arg(long)]
    source_file: Option<PathBuf>,

    /// Directory holding per-locale corpus files (overrides config)
    #[arg(long)]
    locales_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug, Clone)]
struct VerifyArgs {
    /// Target locale to verify (default: every configured locale)
    #[arg(short, long)]
    locale: Option<String>,

    /// Source corpus file (overrides config)
    #[arg(long)]
    source_file: Option<PathBuf>,

    /// Directory holding per-locale corpus files (overrides config)
    #[arg(long)]
    locales_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// quizloc - Localization sync for quiz corpora
///
/// A batch pipeline that keeps multi-locale quiz corpora consistent with the
/// source-language corpus, translating missing, stubbed or broken records
/// through AI providers (Ollama, OpenAI, Anthropic).
#[derive(Parser, Debug)]
#[command(name = "quizloc")]
#[command(version = "1.0.0")]
#[command(about = "Localization sync pipeline for quiz corpora")]
#[command(long_about = "quizloc detects quiz records that are missing, stubbed or structurally \
broken in a target locale and drives them through an AI translation provider, \
with resumable checkpoints and a post-write verification pass.

EXAMPLES:
    quizloc sync                        # Sync every configured locale
    quizloc sync -l es                  # Sync Spanish only
    quizloc sync -l es --fix-only       # Re-fix broken records only
    quizloc sync --verify-only          # Check drift, write nothing
    quizloc verify -l fr                # Verify French corpus structure
    quizloc completions bash            # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different config file with --config-path. If the config file doesn't
    exist, a default one will be created automatically.

EXIT STATUS:
    0 when every record in scope ended in sync, 2 when failed or malformed
    records remain, 1 on fatal errors.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server (default)
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic Claude API (requires API key)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    sync: SyncArgs,
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

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
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
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Load the configuration file, creating a default one when absent
fn load_config(config_path: &str, log_level: Option<&CliLogLevel>) -> Result<Config> {
    let config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        let mut config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;

        if let Some(level) = log_level {
            config.log_level = level.clone().into();
        }
        config
    } else {
        warn!(
            "Config file not found at '{}', creating default config.",
            config_path
        );

        let mut config = Config::default();
        if let Some(level) = log_level {
            config.log_level = level.clone().into();
        }

        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    Ok(config)
}

/// Apply CLI path overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, source_file: Option<&PathBuf>, locales_dir: Option<&PathBuf>) {
    if let Some(source_file) = source_file {
        config.corpus.source_file = source_file.clone();
    }
    if let Some(locales_dir) = locales_dir {
        config.corpus.locales_dir = locales_dir.clone();
    }
}

/// Exit code when unresolved records or violations remain
const EXIT_DIRTY: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "quizloc", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Verify(args)) => run_verify(args).await,
        Some(Commands::Sync(args)) => run_sync(args).await,
        // Default behavior - use top-level args for backwards compatibility
        None => run_sync(cli.sync).await,
    }
}

async fn run_sync(options: SyncArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(to_level_filter(&config_log_level));
    }

    let mut config = load_config(&options.config_path, options.log_level.as_ref())?;
    apply_overrides(&mut config, options.source_file.as_ref(), options.locales_dir.as_ref());

    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(to_level_filter(&config.log_level));
    }

    if options.fix_only && options.verify_only {
        return Err(anyhow!("--fix-only and --verify-only are mutually exclusive"));
    }

    let controller = Controller::with_config(config)?;

    if options.verify_only {
        let outcome = controller.run_verify(options.locale.as_deref())?;
        return finish(outcome.is_clean());
    }

    let outcome = controller
        .run_sync(options.locale.as_deref(), options.fix_only)
        .await?;
    finish(outcome.is_clean())
}

async fn run_verify(options: VerifyArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(to_level_filter(&config_log_level));
    }

    let mut config = load_config(&options.config_path, options.log_level.as_ref())?;
    apply_overrides(&mut config, options.source_file.as_ref(), options.locales_dir.as_ref());

    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(to_level_filter(&config.log_level));
    }

    let controller = Controller::with_config(config)?;
    let outcome = controller.run_verify(options.locale.as_deref())?;
    finish(outcome.is_clean())
}

/// Map the run outcome onto the documented exit status
fn finish(clean: bool) -> Result<()> {
    if clean {
        Ok(())
    } else {
        std::process::exit(EXIT_DIRTY);
    }
}
