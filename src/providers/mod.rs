/*!
 * Translation backends.
 *
 * Every provider is wrapped in an adapter implementing [`TranslationBackend`],
 * so the job orchestrator never needs to know how a provider is called:
 * - `google`: Google Translate web endpoint, no credentials
 * - `microsoft`: Microsoft Translator, subscription key, detects the source language
 * - `chatgpt`: OpenAI chat completions, API key
 * - `pons`: PONS dictionary API, secret header
 * - `ollama`: local Ollama server
 * - `mock`: deterministic stub used by tests
 */

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{BackendKind, ProvidersConfig};
use crate::errors::{JobError, ProviderError};
use crate::language_utils::{self, AUTO_DETECT};

/// Common trait for all translation backends
///
/// Implementations keep no mutable state between calls apart from the
/// credentials and HTTP client captured at construction.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Translate `text` from `source_language` to `target_language`
    ///
    /// # Arguments
    /// * `text` - Text of one subtitle cue, possibly multi-line
    /// * `source_language` - Source language code, or "auto"
    /// * `target_language` - Target language code
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or the provider failure
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Check that the backend can translate between the two languages at all
    ///
    /// Called once before the first cue, so a pair the backend can never
    /// serve is rejected without writing an output document.
    fn supports(&self, _source_language: &str, _target_language: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Lookup table from backend identifier to backend instance
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn TranslationBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding one adapter per known backend
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let mut registry = Self::new();
        for kind in BackendKind::ALL {
            let backend: Arc<dyn TranslationBackend> = match kind {
                BackendKind::Google => Arc::new(google::GoogleBackend::new(&config.google)),
                BackendKind::Microsoft => Arc::new(microsoft::MicrosoftBackend::new(&config.microsoft)),
                BackendKind::ChatGpt => Arc::new(chatgpt::ChatGptBackend::new(&config.chatgpt)),
                BackendKind::Pons => Arc::new(pons::PonsBackend::new(&config.pons)),
                BackendKind::Ollama => Arc::new(ollama::OllamaBackend::new(&config.ollama)),
            };
            registry.insert(kind.id(), backend);
        }
        registry
    }

    /// Add or replace a backend, builder style
    pub fn register(mut self, id: impl Into<String>, backend: Arc<dyn TranslationBackend>) -> Self {
        self.insert(id, backend);
        self
    }

    /// Add or replace a backend
    pub fn insert(&mut self, id: impl Into<String>, backend: Arc<dyn TranslationBackend>) {
        self.backends.insert(id.into().to_lowercase(), backend);
    }

    /// Resolve a backend identifier, failing with a configuration error if unknown
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn TranslationBackend>, JobError> {
        self.backends
            .get(&id.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| JobError::Configuration(format!("Invalid translation service: {}", id)))
    }

    /// Registered identifiers, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Build an HTTP client with the given request timeout
pub(crate) fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .unwrap_or_default()
}

/// Read a response body, turning non-success statuses into provider errors
pub(crate) async fn read_body(provider: &str, response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::from_transport(provider, e))?;

    if !status.is_success() {
        let message = truncate_text(body.trim(), 300);
        error!("{} API error ({}): {}", provider, status, message);
        return Err(ProviderError::from_status(status.as_u16(), format!("{}: {}", provider, message)));
    }

    Ok(body)
}

/// Fill the `{source_language}` / `{target_language}` placeholders of a prompt
pub(crate) fn render_prompt(template: &str, source_language: &str, target_language: &str) -> String {
    let source = if source_language.eq_ignore_ascii_case(AUTO_DETECT) {
        "the language it is written in".to_string()
    } else {
        language_utils::get_language_name(source_language)
    };

    template
        .replace("{source_language}", &source)
        .replace("{target_language}", &language_utils::get_language_name(target_language))
}

/// Truncate text to a maximum number of characters with ellipsis
pub(crate) fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

pub mod chatgpt;
pub mod google;
pub mod microsoft;
pub mod mock;
pub mod ollama;
pub mod pons;
