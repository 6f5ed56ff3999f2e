use serde::{Deserialize, Serialize};
use validator::Validate;

/// Highest refresh level honoured when widening a search
pub const MAX_REFRESH_LEVEL: u8 = 3;

/// How the date window was expressed by the user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DateMode {
    Relative,
    Explicit,
}

/// Date window supplied by the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub mode: DateMode,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl DateRange {
    pub fn relative(label: &str) -> Self {
        Self {
            mode: DateMode::Relative,
            label: Some(label.to_string()),
            start_date: None,
            end_date: None,
        }
    }

    pub fn explicit(start_date: &str, end_date: Option<&str>) -> Self {
        Self {
            mode: DateMode::Explicit,
            label: None,
            start_date: Some(start_date.to_string()),
            end_date: end_date.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Accessibility {
    #[serde(default)]
    pub needs_step_free: bool,
}

/// Refresh counter as sent by the client: a number or a numeric string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RefreshToken {
    Number(i64),
    Float(f64),
    Text(String),
}

impl RefreshToken {
    /// Clamped refresh level; anything unparsable counts as zero.
    pub fn level(&self) -> u8 {
        let raw = match self {
            RefreshToken::Number(n) => *n,
            RefreshToken::Float(f) if f.is_finite() => f.trunc() as i64,
            RefreshToken::Float(_) => 0,
            RefreshToken::Text(s) => s.trim().parse::<i64>().unwrap_or(0),
        };
        raw.clamp(0, MAX_REFRESH_LEVEL as i64) as u8
    }
}

/// Group preferences driving one suggestion request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[validate(range(min = 1))]
    pub group_size: u32,
    #[validate(length(min = 2))]
    pub location: String,
    pub date_range: DateRange,
    #[validate(length(min = 2))]
    pub vibe: String,
    #[validate(length(min = 2))]
    pub event_type: String,
    #[serde(default)]
    pub budget_level: Option<String>,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub age_range_hint: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<RefreshToken>,
}

impl Preferences {
    pub fn refresh_level(&self) -> u8 {
        self.refresh_token.as_ref().map(RefreshToken::level).unwrap_or(0)
    }

    /// Label used when summarising the date fit of a suggestion
    pub fn date_label(&self) -> String {
        match &self.date_range.label {
            Some(label) if !label.trim().is_empty() => label.clone(),
            _ => match (&self.date_range.start_date, &self.date_range.end_date) {
                (Some(start), Some(end)) => format!("{} to {}", start, end),
                (Some(start), None) => start.clone(),
                _ => String::new(),
            },
        }
    }
}
