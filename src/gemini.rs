//! Gemini `generateContent` client for structured menu extraction.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::schema::ExtractedRow;

pub const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("request to the generative service failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("generative service returned HTTP {status}")]
    Service { status: u16, body: String },
    #[error("generative service response was malformed: {0}")]
    MalformedResponse(String),
}

/// Client for the generative-language endpoint. One request per extraction,
/// bounded connect and total timeouts, no retries — retry policy, if any,
/// belongs to the caller.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        api_url: String,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }

    /// Send one extraction request and decode the model's row array.
    ///
    /// The model's JSON answer is nested as a string inside
    /// `candidates[0].content.parts[0].text` and must itself be decoded
    /// before use.
    pub async fn extract_rows(
        &self,
        prompt: &str,
        response_schema: Value,
    ) -> Result<Vec<ExtractedRow>, GeminiError> {
        let body = request_body(prompt, response_schema);

        debug!("Sending extraction request to {}", self.api_url);
        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(GeminiError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::MalformedResponse(e.to_string()))?;

        let rows = decode_rows(envelope)?;
        info!("Generative service returned {} menu rows", rows.len());
        Ok(rows)
    }
}

/// Build the `generateContent` request payload.
fn request_body(prompt: &str, response_schema: Value) -> Value {
    json!({
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": prompt }]
            }
        ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema
        }
    })
}

/// Pull the row array out of the response envelope.
fn decode_rows(envelope: GenerateContentResponse) -> Result<Vec<ExtractedRow>, GeminiError> {
    let text = envelope
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .ok_or_else(|| {
            GeminiError::MalformedResponse("no candidate content in response".to_string())
        })?;

    serde_json::from_str(&text)
        .map_err(|e| GeminiError::MalformedResponse(format!("inner payload is not a row array: {e}")))
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}
