use std::time::Duration;

use async_trait::async_trait;
use biblestudy_types::VerseText;
use serde::Deserialize;
use tracing::debug;

use crate::client::VerseLookup;
use crate::error::{SdkError, SdkResult};

pub const DEFAULT_VERSE_API_URL: &str = "https://bible-api.com";
pub const DEFAULT_TRANSLATION: &str = "kjv";

#[derive(Debug, Deserialize)]
struct VerseResponse {
    text: Option<String>,
    translation_name: Option<String>,
}

/// `VerseLookup` backed by a bible-api.com compatible HTTP service
pub struct BibleApiClient {
    api_url: String,
    translation: String,
    agent: ureq::Agent,
}

impl BibleApiClient {
    pub fn new(api_url: impl Into<String>, translation: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(timeout)
            .build();

        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            translation: translation.into(),
            agent,
        }
    }

    /// Request URL for a reference; only spaces are escaped
    pub fn verse_url(&self, reference: &str) -> String {
        format!(
            "{}/{}?translation={}",
            self.api_url,
            reference.trim().replace(' ', "%20"),
            self.translation
        )
    }

    fn parse_response(&self, reference: &str, body: &str) -> SdkResult<VerseText> {
        let response: VerseResponse = serde_json::from_str(body).map_err(|e| SdkError::VerseLookup {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?;

        let text = response.text.ok_or_else(|| SdkError::VerseLookup {
            reference: reference.to_string(),
            reason: "response has no text".to_string(),
        })?;

        Ok(VerseText {
            text: text.trim().to_string(),
            version: response
                .translation_name
                .unwrap_or_else(|| self.translation.to_uppercase()),
        })
    }
}

#[async_trait]
impl VerseLookup for BibleApiClient {
    async fn lookup_verse_text(&self, reference: &str) -> SdkResult<VerseText> {
        if reference.trim().is_empty() {
            return Err(SdkError::VerseLookup {
                reference: reference.to_string(),
                reason: "empty reference".to_string(),
            });
        }

        let url = self.verse_url(reference);
        debug!(%url, "Looking up verse text");

        let agent = self.agent.clone();
        let body = tokio::task::spawn_blocking(move || {
            agent
                .get(&url)
                .call()
                .map_err(|e| e.to_string())?
                .into_string()
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| SdkError::VerseLookup {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?
        .map_err(|reason| SdkError::VerseLookup {
            reference: reference.to_string(),
            reason,
        })?;

        self.parse_response(reference, &body)
    }
}
