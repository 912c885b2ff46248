use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;

use super::{build_client, read_body, TranslationBackend};
use crate::app_config::GoogleConfig;
use crate::errors::ProviderError;

const PROVIDER: &str = "google";

/// Google Translate through the public `translate_a/single` endpoint.
///
/// No credentials are needed; `auto` is accepted as source language.
#[derive(Debug)]
pub struct GoogleBackend {
    /// HTTP client for API requests
    client: Client,
    /// Endpoint URL
    endpoint: String,
}

impl GoogleBackend {
    /// Create a new Google backend
    pub fn new(config: &GoogleConfig) -> Self {
        Self {
            client: build_client(config.timeout_secs),
            endpoint: config.endpoint.clone(),
        }
    }

    /// Extract the translated text from a response body.
    ///
    /// The body is a nested JSON array whose first element lists the
    /// translated segments; each segment starts with its translated text.
    pub fn parse_response(body: &str) -> Result<String, ProviderError> {
        let json: Value = serde_json::from_str(body)
            .map_err(|e| ProviderError::ParseError(format!("{}: {}", PROVIDER, e)))?;

        let segments = json
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::ParseError(format!("{}: response has no translation segments", PROVIDER)))?;

        let translated: String = segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(Value::as_str))
            .collect();

        if translated.is_empty() {
            return Err(ProviderError::ParseError(format!("{}: empty translation", PROVIDER)));
        }

        Ok(translated)
    }
}

#[async_trait]
impl TranslationBackend for GoogleBackend {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        debug!("{}: {} -> {} ({} chars)", PROVIDER, source_language, target_language, text.len());

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source_language),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(PROVIDER, e))?;

        let body = read_body(PROVIDER, response).await?;
        Self::parse_response(&body)
    }
}
