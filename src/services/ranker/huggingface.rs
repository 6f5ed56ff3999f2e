//! Hugging Face hosted inference API

use reqwest::Client as HttpClient;
use serde_json::{json, Value};

use crate::{
    error::RankError,
    services::ranker::{read_json, RankingBackend, RANK_TIMEOUT},
};

const MAX_NEW_TOKENS: u32 = 400;

#[derive(Clone)]
pub struct HuggingFaceBackend {
    http_client: HttpClient,
    api_token: String,
    model: String,
    api_url: String,
}

impl HuggingFaceBackend {
    pub fn new(api_token: String, model: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_token,
            model,
            api_url,
        }
    }
}

/// `[{"generated_text": ...}]`, or the raw body for models that answer with JSON directly.
fn unwrap_envelope(body: Value) -> String {
    match body
        .get(0)
        .and_then(|first| first.get("generated_text"))
        .and_then(|text| text.as_str())
    {
        Some(text) => text.to_string(),
        None => body.to_string(),
    }
}

#[async_trait::async_trait]
impl RankingBackend for HuggingFaceBackend {
    async fn generate(&self, prompt: &str) -> Result<String, RankError> {
        let url = format!("{}/models/{}", self.api_url, self.model);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&json!({
                "inputs": prompt,
                "parameters": {
                    "max_new_tokens": MAX_NEW_TOKENS,
                    "temperature": 0.2,
                    "return_full_text": false,
                },
            }))
            .timeout(RANK_TIMEOUT)
            .send()
            .await?;

        Ok(unwrap_envelope(read_json(response).await?))
    }

    fn name(&self) -> &'static str {
        "huggingface"
    }
}
