//! Self-hosted Ollama generation endpoint

use reqwest::Client as HttpClient;
use serde_json::json;

use crate::{
    error::RankError,
    services::ranker::{read_json, RankingBackend, RANK_TIMEOUT},
};

#[derive(Clone)]
pub struct OllamaBackend {
    http_client: HttpClient,
    host: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(host: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            host: host.trim_end_matches('/').to_string(),
            model,
        }
    }
}

#[async_trait::async_trait]
impl RankingBackend for OllamaBackend {
    async fn generate(&self, prompt: &str) -> Result<String, RankError> {
        let url = format!("{}/api/generate", self.host);

        let response = self
            .http_client
            .post(&url)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
            }))
            .timeout(RANK_TIMEOUT)
            .send()
            .await?;

        let body = read_json(response).await?;
        body.get("response")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| RankError::Envelope("missing \"response\" field".to_string()))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
