use serde::Deserialize;

/// Application configuration loaded from environment variables
///
/// Every credential is optional: a missing key disables the provider or
/// ranking backend that needs it instead of failing startup.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Google Places text search key
    #[serde(default)]
    pub google_places_api_key: Option<String>,

    /// Geocoding key; the Places key is used when unset
    #[serde(default)]
    pub google_maps_api_key: Option<String>,

    #[serde(default = "default_google_maps_api_url")]
    pub google_maps_api_url: String,

    #[serde(default)]
    pub eventbrite_api_key: Option<String>,

    #[serde(default = "default_eventbrite_api_url")]
    pub eventbrite_api_url: String,

    #[serde(default)]
    pub meetup_api_key: Option<String>,

    #[serde(default = "default_meetup_api_url")]
    pub meetup_api_url: String,

    #[serde(default)]
    pub facebook_graph_api_token: Option<String>,

    /// Older name for the Graph token, read when the main one is unset
    #[serde(default)]
    pub facebook_events_api_token: Option<String>,

    #[serde(default = "default_facebook_graph_api_url")]
    pub facebook_graph_api_url: String,

    /// Ranking backend: `ollama`, `huggingface`, `gemini` (or `google`), `none`
    #[serde(default = "default_ai_backend")]
    pub ai_backend: String,

    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,

    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,

    #[serde(default)]
    pub huggingface_api_token: Option<String>,

    #[serde(default = "default_huggingface_model")]
    pub huggingface_model: String,

    #[serde(default = "default_huggingface_api_url")]
    pub huggingface_api_url: String,

    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default)]
    pub google_gemini_api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Linked-vibes vocabulary file (label → tags/categories)
    #[serde(default = "default_vocabulary_path")]
    pub vocabulary_path: String,

    /// Static event ideas file; the local ideas provider is enabled when set
    #[serde(default)]
    pub event_ideas_path: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_google_maps_api_url() -> String {
    "https://maps.googleapis.com/maps/api".to_string()
}

fn default_eventbrite_api_url() -> String {
    "https://www.eventbriteapi.com/v3".to_string()
}

fn default_meetup_api_url() -> String {
    "https://api.meetup.com".to_string()
}

fn default_facebook_graph_api_url() -> String {
    "https://graph.facebook.com/v20.0".to_string()
}

fn default_ai_backend() -> String {
    "ollama".to_string()
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

fn default_huggingface_model() -> String {
    "tiiuae/falcon-7b-instruct".to_string()
}

fn default_huggingface_api_url() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_vocabulary_path() -> String {
    "data/linked_vibes.json".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Key used for geocoding free-text locations
    pub fn geocode_api_key(&self) -> Option<String> {
        non_blank(&self.google_places_api_key).or_else(|| non_blank(&self.google_maps_api_key))
    }

    /// Facebook Graph token, from either variable name
    pub fn facebook_token(&self) -> Option<String> {
        non_blank(&self.facebook_graph_api_token)
            .or_else(|| non_blank(&self.facebook_events_api_token))
    }

    /// Gemini key, from either variable name
    pub fn gemini_key(&self) -> Option<String> {
        non_blank(&self.gemini_api_key).or_else(|| non_blank(&self.google_gemini_api_key))
    }
}

/// Treats empty or whitespace-only variables as unset.
pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
