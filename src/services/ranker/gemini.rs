//! Google Gemini `generateContent` API

use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::RankError,
    services::ranker::{read_json, RankingBackend, RANK_TIMEOUT},
};

const MAX_OUTPUT_TOKENS: u32 = 500;

#[derive(Clone)]
pub struct GeminiBackend {
    http_client: HttpClient,
    api_key: String,
    model: String,
    api_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ContentCandidate>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentCandidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiBackend {
    pub fn new(api_key: String, model: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            model,
            api_url,
        }
    }
}

/// Concatenated text parts of the first candidate
fn first_candidate_text(response: GenerateContentResponse) -> Option<String> {
    let parts = response.candidates.into_iter().next()?.content?.parts;
    let text: String = parts.into_iter().filter_map(|p| p.text).collect();
    (!text.trim().is_empty()).then_some(text)
}

#[async_trait::async_trait]
impl RankingBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String, RankError> {
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "contents": [{"parts": [{"text": prompt}]}],
                "generationConfig": {
                    "temperature": 0.2,
                    "maxOutputTokens": MAX_OUTPUT_TOKENS,
                },
            }))
            .timeout(RANK_TIMEOUT)
            .send()
            .await?;

        let body: GenerateContentResponse = serde_json::from_value(read_json(response).await?)
            .map_err(|e| RankError::Envelope(e.to_string()))?;

        first_candidate_text(body)
            .ok_or_else(|| RankError::Envelope("no candidate text".to_string()))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
