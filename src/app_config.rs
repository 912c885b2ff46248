use anyhow::{anyhow, Result, Context};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code, or "auto"
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Backend identifier used when none is given on the command line
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Directory receiving translated subtitles
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Path of the job history store
    #[serde(default = "default_history_file")]
    pub history_file: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Optional file receiving a copy of every log line
    #[serde(default = "default_log_file")]
    pub log_file: Option<String>,

    /// Provider settings
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Known translation backends
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    // @provider: Google Translate web endpoint
    #[default]
    Google,
    // @provider: Microsoft Translator
    Microsoft,
    // @provider: OpenAI chat completions
    ChatGpt,
    // @provider: PONS dictionary
    Pons,
    // @provider: Local Ollama server
    Ollama,
}

impl BackendKind {
    /// Every backend, in display order
    pub const ALL: [BackendKind; 5] = [
        Self::Google,
        Self::Microsoft,
        Self::ChatGpt,
        Self::Pons,
        Self::Ollama,
    ];

    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Google => "Google Translate",
            Self::Microsoft => "Microsoft Translator",
            Self::ChatGpt => "ChatGPT",
            Self::Pons => "PONS",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Identifier used in requests and config
    pub fn id(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Microsoft => "microsoft",
            Self::ChatGpt => "chatgpt",
            Self::Pons => "pons",
            Self::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "microsoft" => Ok(Self::Microsoft),
            "chatgpt" => Ok(Self::ChatGpt),
            "pons" => Ok(Self::Pons),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid translation service: {}", s)),
        }
    }
}

/// Per-provider settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub microsoft: MicrosoftConfig,
    #[serde(default)]
    pub chatgpt: ChatGptConfig,
    #[serde(default)]
    pub pons: PonsConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Google Translate settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GoogleConfig {
    /// Service endpoint URL
    #[serde(default = "default_google_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            endpoint: default_google_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Microsoft Translator settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MicrosoftConfig {
    /// Subscription key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Resource region, required for regional resources
    #[serde(default)]
    pub region: Option<String>,

    /// Service endpoint URL
    #[serde(default = "default_microsoft_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MicrosoftConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            region: None,
            endpoint: default_microsoft_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// OpenAI chat completion settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatGptConfig {
    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Model name (e.g., "gpt-4o-mini")
    #[serde(default = "default_chatgpt_model")]
    pub model: String,

    /// Service endpoint URL (for Azure OpenAI or compatible servers)
    #[serde(default = "default_chatgpt_endpoint")]
    pub endpoint: String,

    /// System prompt template.
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ChatGptConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_chatgpt_model(),
            endpoint: default_chatgpt_endpoint(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

/// PONS dictionary settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PonsConfig {
    /// Value of the X-Secret header
    #[serde(default = "String::new")]
    pub secret: String,

    /// Service endpoint URL
    #[serde(default = "default_pons_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PonsConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            endpoint: default_pons_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Ollama service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    /// Model name (e.g., "llama3.2:3b")
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Service endpoint URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// System prompt template.
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: default_ollama_model(),
            endpoint: default_ollama_endpoint(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
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
    /// Matching filter for the log crate
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "fr".to_string()
}

fn default_backend() -> String {
    BackendKind::default().id().to_string()
}

fn default_output_dir() -> String {
    "translations".to_string()
}

fn default_history_file() -> String {
    "translation_history.json".to_string()
}

fn default_log_file() -> Option<String> {
    Some("translate.log".to_string())
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.3
}

fn default_google_endpoint() -> String {
    "https://translate.googleapis.com/translate_a/single".to_string()
}

fn default_microsoft_endpoint() -> String {
    "https://api.cognitive.microsofttranslator.com".to_string()
}

fn default_chatgpt_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_pons_endpoint() -> String {
    "https://api.pons.com/v1/dictionary".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_chatgpt_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_system_prompt() -> String {
    "You are a professional subtitle translator. Translate the user's text from {source_language} to {target_language}. Reply with the translation only, keep line breaks and formatting tags, and maintain the original meaning and tone.".to_string()
}

impl Config {
    /// Load a configuration file, writing a default one when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok((config, false));
        }

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok((config, true))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        language_utils::validate_source_language(&self.source_language)?;

        if !language_utils::is_supported_target(&self.target_language) {
            return Err(anyhow!("Unsupported target language: '{}'", self.target_language));
        }

        self.backend.parse::<BackendKind>()?;

        if self.output_dir.trim().is_empty() {
            return Err(anyhow!("Output directory must not be empty"));
        }

        if self.history_file.trim().is_empty() {
            return Err(anyhow!("History file path must not be empty"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            backend: default_backend(),
            output_dir: default_output_dir(),
            history_file: default_history_file(),
            log_level: LogLevel::default(),
            log_file: default_log_file(),
            providers: ProvidersConfig::default(),
        }
    }
}
