use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{build_client, read_body, TranslationBackend};
use crate::app_config::MicrosoftConfig;
use crate::errors::ProviderError;

const PROVIDER: &str = "microsoft";

/// Microsoft Translator (Text Translation v3).
///
/// The source language is never sent: the service detects it per request.
pub struct MicrosoftBackend {
    /// HTTP client for API requests
    client: Client,
    /// Subscription key
    api_key: String,
    /// Region of the translator resource
    region: Option<String>,
    /// API endpoint URL
    endpoint: String,
}

/// One element of the request body
#[derive(Debug, Serialize)]
struct TranslateInput<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

/// One element of the response body
#[derive(Debug, Deserialize)]
pub struct TranslateResult {
    /// Translations, one per requested target
    pub translations: Vec<Translation>,
}

/// A single translation
#[derive(Debug, Deserialize)]
pub struct Translation {
    /// Translated text
    pub text: String,
    /// Target language code
    pub to: String,
}

impl fmt::Debug for MicrosoftBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrosoftBackend")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("has_api_key", &!self.api_key.is_empty())
            .finish()
    }
}

impl MicrosoftBackend {
    /// Create a new Microsoft backend
    pub fn new(config: &MicrosoftConfig) -> Self {
        Self {
            client: build_client(config.timeout_secs),
            api_key: config.api_key.clone(),
            region: config.region.clone().filter(|r| !r.trim().is_empty()),
            endpoint: config.endpoint.clone(),
        }
    }

    /// Map Google-style tags to the codes Microsoft expects
    pub fn map_language(code: &str) -> String {
        match code {
            "zh-CN" => "zh-Hans",
            "zh-TW" => "zh-Hant",
            "iw" => "he",
            "jw" => "jv",
            "tl" => "fil",
            "no" => "nb",
            "mni-Mtei" => "mni",
            "ckb" => "ku",
            other => other,
        }
        .to_string()
    }

    /// Extract the translated text from a response body
    pub fn parse_response(body: &str) -> Result<String, ProviderError> {
        let results: Vec<TranslateResult> = serde_json::from_str(body)
            .map_err(|e| ProviderError::ParseError(format!("{}: {}", PROVIDER, e)))?;

        results
            .into_iter()
            .next()
            .and_then(|result| result.translations.into_iter().next())
            .map(|translation| translation.text)
            .ok_or_else(|| ProviderError::ParseError(format!("{}: response contains no translation", PROVIDER)))
    }
}

#[async_trait]
impl TranslationBackend for MicrosoftBackend {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::AuthenticationError(
                "Microsoft Translator requires providers.microsoft.api_key".to_string(),
            ));
        }

        let target = Self::map_language(target_language);
        debug!("{}: auto -> {} ({} chars)", PROVIDER, target, text.len());

        let url = format!("{}/translate", self.endpoint.trim_end_matches('/'));
        let mut request = self
            .client
            .post(&url)
            .query(&[("api-version", "3.0"), ("to", target.as_str())])
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .json(&[TranslateInput { text }]);

        if let Some(region) = &self.region {
            request = request.header("Ocp-Apim-Subscription-Region", region);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(PROVIDER, e))?;

        let body = read_body(PROVIDER, response).await?;
        Self::parse_response(&body)
    }
}
