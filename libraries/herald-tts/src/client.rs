//! Synthesis service client.

use async_trait::async_trait;
use herald_core::{TtsClient, TtsError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    language: &'a str,
}

#[derive(Deserialize)]
struct SynthesisResponse {
    audio_url: String,
}

/// Client for the remote text-to-speech service.
///
/// Stateless apart from the connection pool; safe to share behind an `Arc`.
pub struct SynthesisClient {
    http: Client,
    base_url: String,
}

impl SynthesisClient {
    /// Create a client for the service at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL is empty or the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TtsError> {
        let base_url = base_url.into();
        if base_url.is_empty() {
            return Err(TtsError::Request("base URL cannot be empty".into()));
        }
        let base_url = base_url.trim_end_matches('/').to_string();

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("HeraldAudio/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TtsError::Request(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    /// Create a client reusing an existing HTTP connection pool.
    pub fn with_http(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TtsClient for SynthesisClient {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        language: &str,
    ) -> Result<String, TtsError> {
        let url = format!("{}/synthesize", self.base_url);
        debug!(voice_id = %voice_id, language = %language, chars = text.len(), "Requesting synthesis");

        let response = self
            .http
            .post(&url)
            .json(&SynthesisRequest {
                text,
                voice_id,
                language,
            })
            .send()
            .await
            .map_err(|e| TtsError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TtsError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let body: SynthesisResponse = response
            .json()
            .await
            .map_err(|e| TtsError::MalformedResponse(e.to_string()))?;

        if body.audio_url.is_empty() {
            return Err(TtsError::MalformedResponse("empty audio_url".into()));
        }

        info!(voice_id = %voice_id, "Synthesis complete");
        Ok(body.audio_url)
    }
}
