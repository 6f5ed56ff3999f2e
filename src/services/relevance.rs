use std::sync::LazyLock;

use crate::models::Candidate;
use crate::services::keywords::{TokenSet, ART_FALSE_FRIENDS};

const ART_TOKENS: &[&str] = &[
    "art",
    "arts",
    "painting",
    "gallery",
    "museum",
    "exhibit",
    "exhibition",
    "pottery",
    "ceramic",
    "craft",
    "studio",
    "creative",
    "drawing",
    "sketch",
    "sculpture",
    "photography",
];

const FITNESS_TOKENS: &[&str] = &["yoga", "pilates", "fitness", "gym", "wellness"];

const OUTDOOR_TOKENS: &[&str] = &[
    "walk", "hike", "hiking", "trail", "beach", "coast", "cliff", "outdoor", "outdoors", "coastal",
];

const ART_EXCLUDED: &[&str] = &["bar", "night_club", "liquor_store", "restaurant"];
const FITNESS_EXCLUDED: &[&str] = &["art_gallery", "museum"];
const OUTDOOR_EXCLUDED: &[&str] = &[
    "bar",
    "night_club",
    "liquor_store",
    "restaurant",
    "art_gallery",
    "museum",
    "casino",
    "movie_theater",
];

static ART_TOKEN_SET: LazyLock<TokenSet> = LazyLock::new(|| TokenSet::new(ART_TOKENS));

/// Genuine art/creative intent; "party" or "martial arts" do not count.
pub fn has_art_intent(vibe: &str, event_type: &str) -> bool {
    let combined = format!("{} {}", vibe, event_type).trim().to_lowercase();
    if combined.is_empty() || ART_FALSE_FRIENDS.iter().any(|p| combined.contains(p)) {
        return false;
    }
    ART_TOKEN_SET.matches(&combined)
}

/// Whether a provider result looks like a gallery, museum or art session
pub fn is_art_like(title: &str, category: Option<&str>, description: Option<&str>) -> bool {
    if matches!(category, Some("art_gallery") | Some("museum")) {
        return true;
    }
    let text = [Some(title), description]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    has_art_intent(&text, "")
}

fn contains_any(text: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| text.contains(t))
}

/// Intent-aware exclusion of clearly conflicting result categories
///
/// Built once per request from the vibe and event type; every applicable rule
/// is evaluated and a candidate is dropped if any of them excludes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelevanceFilter {
    art: bool,
    fitness: bool,
    outdoor: bool,
    mentions_night: bool,
    night_out: bool,
}

impl RelevanceFilter {
    pub fn for_intent(vibe: &str, event_type: &str) -> Self {
        let vibe_lower = vibe.to_lowercase();
        let event_lower = event_type.trim().to_lowercase();

        Self {
            art: has_art_intent(vibe, event_type),
            fitness: contains_any(&vibe_lower, FITNESS_TOKENS),
            outdoor: contains_any(&vibe_lower, OUTDOOR_TOKENS),
            mentions_night: vibe_lower.contains("night") || event_lower.contains("night"),
            night_out: vibe_lower.contains("night out") || event_lower.starts_with("night"),
        }
    }

    pub fn art_intent(&self) -> bool {
        self.art
    }

    pub fn keeps(&self, candidate: &Candidate) -> bool {
        !self.excludes(
            candidate.category.as_deref(),
            &candidate.title,
            candidate.description.as_deref(),
        )
    }

    pub fn excludes(&self, category: Option<&str>, title: &str, description: Option<&str>) -> bool {
        // Nightlife is the point of a night out
        if self.night_out {
            return false;
        }

        let in_set = |set: &[&str]| category.is_some_and(|c| set.contains(&c));

        if self.art && in_set(ART_EXCLUDED) {
            return true;
        }
        if self.fitness {
            if in_set(FITNESS_EXCLUDED) {
                return true;
            }
            // Only under fitness intent, so board-game or pub vibes keep studios and galleries
            if !self.art && is_art_like(title, category, description) {
                return true;
            }
        }
        if self.outdoor && !self.mentions_night && in_set(OUTDOOR_EXCLUDED) {
            return true;
        }
        false
    }
}
