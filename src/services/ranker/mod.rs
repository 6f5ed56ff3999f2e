//! Candidate ranking through a pluggable text-generation backend
//!
//! The ranker never raises: any backend, envelope or schema problem is logged
//! and turned into an empty ranking so the caller can fall back.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Response;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    config::{non_blank, Config},
    error::RankError,
    models::{
        Candidate, CandidateKind, ExternalRef, Location, Preferences, RecommendedFlow, Suggestion,
        MAX_SUGGESTIONS,
    },
    services::date_window::resolve_date_window,
};

pub mod gemini;
pub mod huggingface;
pub mod ollama;

pub use gemini::GeminiBackend;
pub use huggingface::HuggingFaceBackend;
pub use ollama::OllamaBackend;

/// Candidates included in the prompt
pub const PROMPT_CANDIDATE_LIMIT: usize = 8;
pub(crate) const RANK_TIMEOUT: Duration = Duration::from_secs(30);
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// A text-generation service that answers a ranking prompt
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RankingBackend: Send + Sync {
    /// Sends the prompt and returns the generated text, already unwrapped from
    /// the backend's response envelope.
    async fn generate(&self, prompt: &str) -> Result<String, RankError>;

    fn name(&self) -> &'static str;
}

/// Turns a non-2xx response into [`RankError::Status`] and decodes the JSON body.
pub(crate) async fn read_json(response: Response) -> Result<Value, RankError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RankError::Status {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }
    Ok(response.json::<Value>().await?)
}

/// Selects the backend named by `AI_BACKEND`, if its credentials are present.
pub fn build_backend(config: &Config) -> Option<Arc<dyn RankingBackend>> {
    match config.ai_backend.trim().to_lowercase().as_str() {
        "none" | "off" | "disabled" => {
            tracing::info!("Ranking disabled by AI_BACKEND");
            None
        }
        "huggingface" | "hf" => match non_blank(&config.huggingface_api_token) {
            Some(token) => Some(Arc::new(HuggingFaceBackend::new(
                token,
                config.huggingface_model.clone(),
                config.huggingface_api_url.clone(),
            ))),
            None => {
                tracing::info!("HUGGINGFACE_API_TOKEN not set; ranking disabled");
                None
            }
        },
        "gemini" | "google" => match config.gemini_key() {
            Some(key) => Some(Arc::new(GeminiBackend::new(
                key,
                config.gemini_model.clone(),
                config.gemini_api_url.clone(),
            ))),
            None => {
                tracing::info!("GEMINI_API_KEY not set; ranking disabled");
                None
            }
        },
        other => {
            if other != "ollama" {
                tracing::warn!(backend = %other, "Unknown AI_BACKEND, using ollama");
            }
            Some(Arc::new(OllamaBackend::new(
                config.ollama_host.clone(),
                config.ollama_model.clone(),
            )))
        }
    }
}

#[derive(Clone)]
pub struct Ranker {
    backend: Option<Arc<dyn RankingBackend>>,
}

impl Ranker {
    pub fn new(backend: Option<Arc<dyn RankingBackend>>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|b| b.name())
    }

    /// Ranked suggestions, or an empty list when ranking is unavailable or fails.
    pub async fn rank(&self, prefs: &Preferences, candidates: &[Candidate]) -> Vec<Suggestion> {
        match self.try_rank(prefs, candidates).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::warn!(
                    backend = self.backend_name().unwrap_or("none"),
                    error = %e,
                    "Ranking failed"
                );
                Vec::new()
            }
        }
    }

    pub async fn try_rank(
        &self,
        prefs: &Preferences,
        candidates: &[Candidate],
    ) -> Result<Vec<Suggestion>, RankError> {
        let Some(backend) = &self.backend else {
            return Ok(Vec::new());
        };
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = build_prompt(prefs, candidates);
        let text = generate_with_retry(backend.as_ref(), &prompt).await?;
        let suggestions = parse_suggestions(&text, prefs)?;

        tracing::info!(backend = backend.name(), count = suggestions.len(), "Ranked candidates");
        Ok(suggestions)
    }
}

async fn generate_with_retry(backend: &dyn RankingBackend, prompt: &str) -> Result<String, RankError> {
    match backend.generate(prompt).await {
        Err(e) if e.is_transient() => {
            tracing::warn!(backend = backend.name(), error = %e, "Ranking call failed, retrying");
            tokio::time::sleep(RETRY_BACKOFF).await;
            backend.generate(prompt).await
        }
        result => result,
    }
}

fn date_line(prefs: &Preferences) -> String {
    let label = prefs.date_label();
    match resolve_date_window(&prefs.date_range) {
        Some(window) => format!(
            "{} ({} to {})",
            if label.is_empty() { "flexible" } else { label.as_str() },
            window.start_date(),
            window.end_date()
        ),
        None => label,
    }
}

/// Prompt asking the backend to rank and annotate up to [`PROMPT_CANDIDATE_LIMIT`] candidates.
pub fn build_prompt(prefs: &Preferences, candidates: &[Candidate]) -> String {
    let options: Vec<Value> = candidates
        .iter()
        .take(PROMPT_CANDIDATE_LIMIT)
        .map(|c| {
            json!({
                "id": c.id,
                "title": c.title,
                "category": c.category,
                "type": c.kind,
                "location": {"name": c.location.name, "address": c.location.address},
                "external": {"source": c.external.source, "url": c.external.url},
                "price": c.rough_price,
                "rating": c.rating,
                "description": c.description,
            })
        })
        .collect();
    let options = serde_json::to_string(&options).unwrap_or_else(|_| "[]".to_string());

    let mut lines = vec![
        "You are helping people plan group events. Rank the supplied venue/event candidates and respond with JSON only.".to_string(),
        "User preferences:".to_string(),
        format!("- group size: {}", prefs.group_size),
        format!("- location: {}", prefs.location),
        format!("- dates: {}", date_line(prefs)),
        format!("- vibe: {}", prefs.vibe),
        format!("- event type: {}", prefs.event_type),
        format!(
            "- budget: {}",
            prefs.budget_level.as_deref().unwrap_or("unknown")
        ),
        format!(
            "- accessibility: step free needed = {}",
            prefs.accessibility.needs_step_free
        ),
    ];
    if let Some(ages) = prefs.age_range_hint.as_deref().filter(|a| !a.trim().is_empty()) {
        lines.push(format!("- ages: {}", ages));
    }
    lines.push(String::new());
    lines.push("Candidate options (JSON):".to_string());
    lines.push(options);
    lines.push(String::new());
    lines.push(format!(
        "Return a JSON object with a single key \"suggestions\": a list of up to {} entries. Each entry must include:",
        MAX_SUGGESTIONS
    ));
    lines.extend(
        [
            "- id (from candidate)",
            "- title",
            "- category",
            "- type (\"venue\" or \"event\")",
            "- recommendedFlow (\"meals_drinks\", \"trip\", or \"general\")",
            "- location: name and address if known",
            "- external: source and url",
            "- dateFitSummary",
            "- groupFitSummary",
            "- whySuitable",
            "- roughPrice",
            "Respond with valid JSON only and nothing else.",
        ]
        .map(str::to_string),
    );
    lines.join("\n")
}

/// Outermost `{...}` span, which also strips markdown code fences.
fn extract_json_object(text: &str) -> &str {
    let text = text.trim();
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

#[derive(Debug, Deserialize)]
struct RankingPayload {
    suggestions: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSuggestion {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    recommended_flow: Option<String>,
    #[serde(default)]
    location: Option<Location>,
    #[serde(default)]
    external: Option<ExternalRef>,
    #[serde(default)]
    date_fit_summary: Option<String>,
    #[serde(default)]
    group_fit_summary: Option<String>,
    #[serde(default)]
    why_suitable: Option<String>,
    #[serde(default)]
    rough_price: Option<Value>,
    #[serde(default)]
    image_url: Option<String>,
}

/// Scalar JSON value as text; models sometimes emit ids and prices as numbers.
fn scalar_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl RawSuggestion {
    fn into_suggestion(self, prefs: &Preferences) -> Option<Suggestion> {
        let id = scalar_text(self.id)?;
        let title = self.title.filter(|t| !t.trim().is_empty())?;

        Some(Suggestion {
            id,
            title,
            category: self.category,
            kind: match self.kind.as_deref().map(str::to_lowercase).as_deref() {
                Some("event") => CandidateKind::Event,
                _ => CandidateKind::Venue,
            },
            recommended_flow: self
                .recommended_flow
                .as_deref()
                .and_then(RecommendedFlow::parse)
                .unwrap_or_else(|| RecommendedFlow::for_event_type(&prefs.event_type)),
            location: self.location.unwrap_or_default(),
            external: self.external.unwrap_or_default(),
            date_fit_summary: self.date_fit_summary,
            group_fit_summary: self.group_fit_summary,
            why_suitable: self.why_suitable,
            rough_price: scalar_text(self.rough_price),
            image_url: self.image_url,
        })
    }
}

/// Parses generated text into at most [`MAX_SUGGESTIONS`] validated suggestions.
///
/// Entries without an id or title, or with mistyped fields, are dropped.
pub fn parse_suggestions(text: &str, prefs: &Preferences) -> Result<Vec<Suggestion>, RankError> {
    let payload: Value = serde_json::from_str(extract_json_object(text))?;
    let payload: RankingPayload =
        serde_json::from_value(payload).map_err(|e| RankError::Schema(e.to_string()))?;

    let mut suggestions = Vec::new();
    for (index, entry) in payload.suggestions.into_iter().enumerate() {
        let parsed = serde_json::from_value::<RawSuggestion>(entry)
            .ok()
            .and_then(|raw| raw.into_suggestion(prefs));
        match parsed {
            Some(suggestion) => suggestions.push(suggestion),
            None => tracing::warn!(index, "Dropping malformed ranked suggestion"),
        }
        if suggestions.len() == MAX_SUGGESTIONS {
            break;
        }
    }
    Ok(suggestions)
}
