use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;

use super::{build_client, read_body, TranslationBackend};
use crate::app_config::PonsConfig;
use crate::errors::ProviderError;
use crate::language_utils::AUTO_DETECT;

const PROVIDER: &str = "pons";

// @const: HTML tags embedded in dictionary results
static HTML_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// PONS online dictionary.
///
/// Works best on single words and short phrases; the source language must be explicit.
pub struct PonsBackend {
    /// HTTP client for API requests
    client: Client,
    /// Value for the X-Secret header
    secret: String,
    /// Dictionary endpoint URL
    endpoint: String,
}

/// Results for one language of the dictionary
#[derive(Debug, Deserialize)]
pub struct PonsLanguage {
    /// Language code of the headwords
    pub lang: String,
    /// Dictionary hits
    #[serde(default)]
    pub hits: Vec<PonsHit>,
}

/// One dictionary hit
#[derive(Debug, Deserialize)]
pub struct PonsHit {
    /// Headword groups, absent for full-text hits
    #[serde(default)]
    pub roms: Vec<PonsRom>,
}

/// Headword group
#[derive(Debug, Deserialize)]
pub struct PonsRom {
    /// Meaning groups
    #[serde(default)]
    pub arabs: Vec<PonsArab>,
}

/// Meaning group
#[derive(Debug, Deserialize)]
pub struct PonsArab {
    /// Source/target pairs
    #[serde(default)]
    pub translations: Vec<PonsTranslation>,
}

/// Source/target pair, both fields may contain HTML
#[derive(Debug, Deserialize)]
pub struct PonsTranslation {
    pub source: String,
    pub target: String,
}

impl fmt::Debug for PonsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PonsBackend")
            .field("endpoint", &self.endpoint)
            .field("has_secret", &!self.secret.is_empty())
            .finish()
    }
}

impl PonsBackend {
    /// Create a new PONS backend
    pub fn new(config: &PonsConfig) -> Self {
        Self {
            client: build_client(config.timeout_secs),
            secret: config.secret.clone(),
            endpoint: config.endpoint.clone(),
        }
    }

    /// Dictionary identifier for a language pair, e.g. `en` + `fr` -> `enfr`
    pub fn dictionary_code(source_language: &str, target_language: &str) -> Result<String, ProviderError> {
        let primary = |code: &str| code.split('-').next().unwrap_or_default().to_lowercase();
        let (source, target) = (primary(source_language), primary(target_language));

        if source.len() != 2 || target.len() != 2 || source == target {
            return Err(ProviderError::UnsupportedLanguage(format!(
                "{}: no dictionary for {} -> {}",
                PROVIDER, source_language, target_language
            )));
        }

        let mut pair = [source, target];
        pair.sort();
        Ok(pair.concat())
    }

    /// Extract the first translation from a response body
    pub fn parse_response(body: &str) -> Result<String, ProviderError> {
        if body.trim().is_empty() {
            return Err(ProviderError::ParseError(format!("{}: no dictionary entry found", PROVIDER)));
        }

        let languages: Vec<PonsLanguage> = serde_json::from_str(body)
            .map_err(|e| ProviderError::ParseError(format!("{}: {}", PROVIDER, e)))?;

        languages
            .iter()
            .flat_map(|language| &language.hits)
            .flat_map(|hit| &hit.roms)
            .flat_map(|rom| &rom.arabs)
            .flat_map(|arab| &arab.translations)
            .map(|translation| Self::strip_html(&translation.target))
            .find(|target| !target.is_empty())
            .ok_or_else(|| ProviderError::ParseError(format!("{}: no dictionary entry found", PROVIDER)))
    }

    /// Remove markup and the most common entities
    fn strip_html(text: &str) -> String {
        HTML_TAG_REGEX
            .replace_all(text, "")
            .replace("&nbsp;", " ")
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .trim()
            .to_string()
    }
}

#[async_trait]
impl TranslationBackend for PonsBackend {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn supports(&self, source_language: &str, target_language: &str) -> Result<(), ProviderError> {
        if source_language.eq_ignore_ascii_case(AUTO_DETECT) {
            return Err(ProviderError::UnsupportedLanguage(format!(
                "{}: source language must be explicit",
                PROVIDER
            )));
        }
        Self::dictionary_code(source_language, target_language).map(|_| ())
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        if self.secret.is_empty() {
            return Err(ProviderError::AuthenticationError(
                "PONS requires providers.pons.secret".to_string(),
            ));
        }
        self.supports(source_language, target_language)?;

        let dictionary = Self::dictionary_code(source_language, target_language)?;
        let source = source_language.to_lowercase();
        debug!("{}: dictionary {} for '{}'", PROVIDER, dictionary, text);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", text),
                ("l", dictionary.as_str()),
                ("in", source.as_str()),
            ])
            .header("X-Secret", &self.secret)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(PROVIDER, e))?;

        let body = read_body(PROVIDER, response).await?;
        Self::parse_response(&body)
    }
}
