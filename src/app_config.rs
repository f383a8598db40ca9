use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::database::models::{Language, RemovalPolicy};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Storage settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Quiz round settings
    #[serde(default)]
    pub quiz: QuizConfig,

    /// Dictionary editing settings
    #[serde(default)]
    pub dictionary: DictionaryConfig,

    /// Per-learner session settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Which side of a pair is shown as the prompt
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PromptDirection {
    // @direction: English prompt, Russian options
    #[default]
    English,
    // @direction: Russian prompt, English options
    Russian,
    // @direction: Coin flip per round
    Random,
}

impl PromptDirection {
    // @returns: Fixed prompt language, or None when chosen per round
    pub fn fixed_language(&self) -> Option<Language> {
        match self {
            Self::English => Some(Language::English),
            Self::Russian => Some(Language::Russian),
            Self::Random => None,
        }
    }
}

impl std::fmt::Display for PromptDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::English => write!(f, "english"),
            Self::Russian => write!(f, "russian"),
            Self::Random => write!(f, "random"),
        }
    }
}

impl std::str::FromStr for PromptDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "english" => Ok(Self::English),
            "russian" => Ok(Self::Russian),
            "random" => Ok(Self::Random),
            _ => Err(anyhow!("Invalid prompt direction: {}", s)),
        }
    }
}

/// Storage configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// SQLite file path; the platform data directory is used when absent
    #[serde(default)]
    pub path: Option<String>,

    /// How long a statement waits on a locked database, in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Quiz round configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuizConfig {
    /// Wrong options shown next to the correct one
    #[serde(default = "default_distractor_count")]
    pub distractor_count: usize,

    /// Prompt language selection
    #[serde(default)]
    pub prompt_language: PromptDirection,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            distractor_count: default_distractor_count(),
            prompt_language: PromptDirection::default(),
        }
    }
}

/// Dictionary editing configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DictionaryConfig {
    /// How removing a learner's word treats rows others may share
    #[serde(default)]
    pub removal_policy: RemovalPolicy,

    /// Longest accepted word, in characters
    #[serde(default = "default_max_word_length")]
    pub max_word_length: usize,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            removal_policy: RemovalPolicy::default(),
            max_word_length: default_max_word_length(),
        }
    }
}

/// Session registry configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SessionConfig {
    /// Drop sessions idle for longer than this many seconds; never when absent
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Upper bound for distractors per round
pub const MAX_DISTRACTORS: usize = 10;

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_distractor_count() -> usize {
    4
}

fn default_max_word_length() -> usize {
    60
}

impl Config {
    /// Load a configuration file, writing the defaults there first if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        log::warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.quiz.distractor_count == 0 || self.quiz.distractor_count > MAX_DISTRACTORS {
            return Err(anyhow!(
                "quiz.distractor_count must be between 1 and {}, got {}",
                MAX_DISTRACTORS,
                self.quiz.distractor_count
            ));
        }

        if self.dictionary.max_word_length == 0 {
            return Err(anyhow!("dictionary.max_word_length must be positive"));
        }

        if self.session.idle_timeout_secs == Some(0) {
            return Err(anyhow!("session.idle_timeout_secs must be positive when set"));
        }

        if let Some(path) = &self.database.path {
            if path.trim().is_empty() {
                return Err(anyhow!("database.path must not be empty when set"));
            }
        }

        Ok(())
    }

    /// Resolve the database file location
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => crate::database::DatabaseConnection::default_database_path(),
        }
    }
}
