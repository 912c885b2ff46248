// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use subtrans::app_config::{self, Config};
use subtrans::app_controller::{Controller, RunOptions};
use subtrans::history::HistoryStore;
use subtrans::language_utils::{self, SUPPORTED_TARGET_LANGUAGES};

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
    /// Translate subtitle files (default command)
    Translate(TranslateArgs),

    /// List past translation jobs
    History {
        /// Show the full entry with this number
        #[arg(long, value_name = "N")]
        show: Option<usize>,

        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,
    },

    /// List the supported target languages
    Languages,

    /// Generate shell completions for subtrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input subtitle file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Source language code (e.g., 'en', 'es', 'auto')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'fr', 'de', 'zh-CN')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Translation backend (google, microsoft, chatgpt, pons, ollama)
    #[arg(short, long)]
    backend: Option<String>,

    /// Output file name without extension, single file input only
    #[arg(short, long)]
    output_name: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// subtrans - subtitle translation with interchangeable backends
///
/// Translates SRT subtitles cue by cue through Google Translate, Microsoft
/// Translator, ChatGPT, PONS or a local Ollama model.
#[derive(Parser, Debug)]
#[command(name = "subtrans")]
#[command(version)]
#[command(about = "Subtitle translation tool")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "subtrans translates SRT subtitle files cue by cue with a translation backend.

EXAMPLES:
    subtrans movie.srt                          # Translate using default config
    subtrans -s en -t es movie.srt              # Translate from English to Spanish
    subtrans -b microsoft -t de movie.srt       # Use a specific backend
    subtrans -o movie.french movie.srt          # Choose the output file name
    subtrans --log-level debug /subtitles/      # Process entire directory with debug logging
    subtrans history                            # List past jobs
    subtrans completions bash > subtrans.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. Provider credentials live in its providers section.

SUPPORTED BACKENDS:
    google    - Google Translate web endpoint (no key)
    microsoft - Microsoft Translator (subscription key)
    chatgpt   - OpenAI chat completions (API key)
    pons      - PONS dictionary (secret)
    ollama    - Local Ollama server (default: llama3.2:3b)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input subtitle file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Source language code (e.g., 'en', 'es', 'auto')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'fr', 'de', 'zh-CN')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Translation backend (google, microsoft, chatgpt, pons, ollama)
    #[arg(short, long)]
    backend: Option<String>,

    /// Output file name without extension, single file input only
    #[arg(short, long)]
    output_name: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
    // @field: Optional plain-text copy of every line
    file: Option<Mutex<File>>,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter, file: Option<File>) -> Self {
        CustomLogger {
            level,
            file: file.map(Mutex::new),
        }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter, log_file: Option<&str>) -> Result<(), SetLoggerError> {
        let file = log_file.and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| eprintln!("Cannot open log file {}: {}", path, e))
                .ok()
        });

        log::set_boxed_logger(Box::new(CustomLogger::new(level, file)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
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
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = chrono::Local::now();
        let _ = writeln!(
            std::io::stderr(),
            "{}{} {:<5} {}\x1B[0m",
            Self::color_for_level(record.level()),
            now.format("%H:%M:%S.%3f"),
            record.level(),
            record.args()
        );

        if let Some(file) = &self.file {
            let _ = writeln!(
                file.lock(),
                "{} {:<5} {}",
                now.format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
        if let Some(file) = &self.file {
            let _ = file.lock().flush();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subtrans", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Languages) => {
            for code in SUPPORTED_TARGET_LANGUAGES {
                println!("{:<8} {}", code, language_utils::get_language_name(code));
            }
            Ok(())
        }
        Some(Commands::History { show, config_path }) => show_history(&config_path, show),
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - top-level args act as the translate command
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

            let translate_args = TranslateArgs {
                input_path,
                source_language: cli.source_language,
                target_language: cli.target_language,
                backend: cli.backend,
                output_name: cli.output_name,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_translate(translate_args).await
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let (mut config, created) = Config::load_or_create(&options.config_path)?;
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    CustomLogger::init(config.log_level.to_level_filter(), config.log_file.as_deref())?;
    if created {
        warn!("Config file not found at '{}', created a default one.", options.config_path);
    }

    // File values are checked here; command line overrides are checked by each job
    config.validate().context("Configuration validation failed")?;

    let mut run_options = RunOptions::from_config(&config);
    if let Some(source_language) = options.source_language {
        run_options.source_language = source_language;
    }
    if let Some(target_language) = options.target_language {
        run_options.target_language = target_language;
    }
    if let Some(backend) = options.backend {
        run_options.backend = backend;
    }
    run_options.output_name = options.output_name;

    let controller = Controller::with_config(config)?;
    let summary = controller.run(&options.input_path, &run_options).await?;

    for outcome in &summary.outcomes {
        match &outcome.output_path {
            Some(path) if outcome.is_success() => info!("Success: {}", path.display()),
            Some(path) => warn!("Partial output: {}", path.display()),
            None => {}
        }
    }

    if summary.is_success() {
        Ok(())
    } else {
        error!("{} of {} job(s) failed", summary.failed(), summary.outcomes.len());
        Err(anyhow!("Translation failed"))
    }
}

fn show_history(config_path: &str, show: Option<usize>) -> Result<()> {
    let (config, _) = Config::load_or_create(config_path)?;
    let history = HistoryStore::load(&config.history_file)
        .with_context(|| format!("Failed to load translation history from {}", config.history_file))?;

    if let Some(number) = show {
        let entry = number
            .checked_sub(1)
            .and_then(|index| history.get(index))
            .ok_or_else(|| anyhow!("No history entry #{} ({} recorded)", number, history.len()))?;

        println!("Source file: {}", entry.source_file.display());
        println!("Success:     {}", if entry.success { "yes" } else { "no" });
        println!("Summary:     {}", entry.summary);
        return Ok(());
    }

    if history.is_empty() {
        println!("No translation history in {}", history.path().display());
        return Ok(());
    }

    for (index, entry) in history.all().iter().enumerate() {
        println!("{:>4}. {}", index + 1, entry.summary);
    }
    Ok(())
}
