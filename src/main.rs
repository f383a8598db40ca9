// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use lexidrill::app_config::{self, Config};
use lexidrill::database::models::LearnerId;
use lexidrill::{dictionary, ConsoleTransport, Controller};

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
    /// Start an interactive drill session in the terminal (default command)
    Chat {
        /// Learner id the session runs as
        #[arg(long, default_value_t = 1)]
        learner_id: LearnerId,

        /// Display name used when the learner is registered
        #[arg(short, long, default_value = "Learner")]
        name: String,
    },

    /// Load shared word pairs into the dictionary
    Seed {
        /// JSON array of {"english", "russian"} objects; the starter vocabulary when omitted
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Print dictionary statistics
    Stats,

    /// Generate shell completions for lexidrill
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Lexidrill - English/Russian vocabulary drills
///
/// Quizzes learners on a shared bilingual dictionary and lets them grow
/// their own word list.
#[derive(Parser, Debug)]
#[command(name = "lexidrill")]
#[command(version)]
#[command(about = "Flashcard-style English/Russian vocabulary trainer")]
#[command(long_about = "Lexidrill quizzes you on English/Russian word pairs from a shared dictionary.

EXAMPLES:
    lexidrill                                   # Start a drill session as learner 1
    lexidrill chat --learner-id 7 -n Alice      # Drill as another learner
    lexidrill seed                              # Load the starter vocabulary
    lexidrill seed -f pairs.json                # Load pairs from a JSON file
    lexidrill stats                             # Show dictionary counters
    lexidrill completions bash > lexidrill.bash # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Dictionary database file, overriding the configuration
    #[arg(short, long, env = "LEXIDRILL_DATABASE", global = true)]
    database: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
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

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // Filtering happens through log::set_max_level so the level can change after init
        metadata.level() <= self.level.max(log::max_level())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
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

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "lexidrill", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let controller = Controller::with_config(config)?;

    match cli.command {
        Some(Commands::Seed { file }) => {
            let pairs = match file {
                Some(path) => dictionary::load_seed_file(&path)?,
                None => dictionary::default_seed(),
            };
            controller.seed(pairs).await?;
        }
        Some(Commands::Stats) => {
            let stats = controller.stats().await?;
            println!("{}", stats);
        }
        Some(Commands::Chat { learner_id, name }) => {
            run_chat(&controller, learner_id, name).await?;
        }
        None => {
            run_chat(&controller, 1, "Learner".to_string()).await?;
        }
        Some(Commands::Completions { .. }) => {}
    }

    Ok(())
}

/// Load the config file and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &cli.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&cli.config_path)
        .with_context(|| format!("Failed to load configuration from {}", cli.config_path))?;

    if let Some(database) = &cli.database {
        config.database.path = Some(database.to_string_lossy().to_string());
    }

    match &cli.log_level {
        Some(log_level) => config.log_level = log_level.clone().into(),
        // Just update the max level without reinitializing the logger
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    Ok(config)
}

async fn run_chat(controller: &Controller, learner_id: LearnerId, name: String) -> Result<()> {
    controller.ensure_seeded().await?;

    info!("Drill session for learner {} ({}). Send /cards to begin, Ctrl-D to quit.", learner_id, name);
    let mut transport = ConsoleTransport::new(learner_id, name);
    controller.serve(&mut transport).await?;
    Ok(())
}
