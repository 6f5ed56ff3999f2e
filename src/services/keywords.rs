use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Used when no vibe or event-type rule fires
const GENERIC_TERMS: &[&str] = &["group friendly", "fun venue"];

/// Compound phrases that contain an art token without meaning art
pub(crate) const ART_FALSE_FRIENDS: &[&str] = &["martial art"];

/// A single trigger, matched on word boundaries unless it is a phrase
enum TokenMatcher {
    Phrase(String),
    Word(Regex),
}

impl TokenMatcher {
    fn new(token: &str) -> Self {
        let token = token.to_lowercase();
        if token.contains(' ') {
            return TokenMatcher::Phrase(token);
        }
        match Regex::new(&format!(r"\b{}\b", regex::escape(&token))) {
            Ok(re) => TokenMatcher::Word(re),
            Err(_) => TokenMatcher::Phrase(token),
        }
    }

    fn is_match(&self, text: &str) -> bool {
        match self {
            TokenMatcher::Phrase(phrase) => text.contains(phrase.as_str()),
            TokenMatcher::Word(re) => re.is_match(text),
        }
    }
}

/// Precompiled set of trigger words and phrases
///
/// Single words must match a whole word, so "art" fires on "art class" but not on
/// "party" or "arts". Multi-word phrases match as substrings.
pub struct TokenSet {
    matchers: Vec<TokenMatcher>,
}

impl TokenSet {
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            matchers: tokens.iter().map(|t| TokenMatcher::new(t)).collect(),
        }
    }

    /// `text` is lowercased before matching.
    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        !text.is_empty() && self.matchers.iter().any(|m| m.is_match(&text))
    }
}

struct KeywordRule {
    triggers: TokenSet,
    suppressed_by: &'static [&'static str],
    terms: &'static [&'static str],
}

impl KeywordRule {
    fn new(triggers: &[&str], terms: &'static [&'static str]) -> Self {
        Self {
            triggers: TokenSet::new(triggers),
            suppressed_by: &[],
            terms,
        }
    }

    fn suppressed_by(mut self, phrases: &'static [&'static str]) -> Self {
        self.suppressed_by = phrases;
        self
    }

    fn fires(&self, vibe_lower: &str) -> bool {
        if self.suppressed_by.iter().any(|p| vibe_lower.contains(p)) {
            return false;
        }
        self.triggers.matches(vibe_lower)
    }
}

static KEYWORD_RULES: LazyLock<Vec<KeywordRule>> = LazyLock::new(|| {
    vec![
        KeywordRule::new(
            &["art", "paint", "drawing", "gallery", "pottery", "sketch"],
            &["art class", "painting class", "pottery class", "art studio"],
        )
        .suppressed_by(ART_FALSE_FRIENDS),
        KeywordRule::new(
            &["yoga", "pilates", "fitness", "gym", "wellness", "stretch"],
            &[
                "yoga class",
                "yoga studio",
                "pilates studio",
                "fitness class",
                "wellness studio",
            ],
        ),
        KeywordRule::new(&["fishing", "lake", "pond"], &["fishing lake", "fishing pond"]),
        KeywordRule::new(
            &["girly night", "girls night", "hen", "bachelorette"],
            &["cocktail bar", "rooftop bar"],
        ),
        KeywordRule::new(&["darts"], &["darts bar", "pub with darts"]),
        KeywordRule::new(
            &["chess", "board game", "tabletop", "catan"],
            &["board game cafe", "games night", "board games"],
        ),
        KeywordRule::new(&["live music", "gig", "concert"], &["live music", "concert venue"]),
        KeywordRule::new(&["escape room"], &["escape room"]),
        KeywordRule::new(&["karaoke"], &["karaoke bar"]),
        KeywordRule::new(&["bowling"], &["bowling alley"]),
        KeywordRule::new(&["outdoor", "outdoors"], &["park", "hiking", "scenic walk"]),
        KeywordRule::new(&["family"], &["family friendly", "kids friendly"]),
        KeywordRule::new(
            &["beach", "coast", "seaside", "sea", "cliff", "cliffs", "coastal"],
            &["beach", "coastal walk", "clifftop walk"],
        ),
        KeywordRule::new(&["walk", "hike", "hiking", "trail"], &["scenic walk", "hiking trail"]),
    ]
});

/// Maps a vibe and event type to provider-friendly search phrases.
///
/// Deterministic and order-preserving: rule order first, then event-type terms.
pub fn expand_keywords(vibe: &str, event_type: &str) -> Vec<String> {
    let vibe = vibe.to_lowercase();
    let event_type = event_type.trim().to_lowercase();
    let mut terms: Vec<&str> = Vec::new();

    for rule in KEYWORD_RULES.iter() {
        if rule.fires(&vibe) {
            terms.extend(rule.terms);
        }
    }

    if event_type.starts_with("meal") || event_type.contains("drink") {
        terms.extend(["restaurant", "bar"]);
    }
    if event_type.starts_with("trip") {
        terms.push("weekend trip ideas");
    }
    if event_type.starts_with("day out") {
        terms.push("day trip ideas");
    }
    if event_type.starts_with("night") {
        terms.push("nightlife");
    }
    if terms.is_empty() {
        terms.extend(GENERIC_TERMS);
    }

    dedup_terms(terms)
}

/// Drops blanks and repeats, keeping first occurrences in order.
pub(crate) fn dedup_terms<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|item| item.as_ref().trim().to_string())
        .filter(|item| !item.is_empty() && seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_set_whole_word() {
        let art = TokenSet::new(&["art"]);
        assert!(art.matches("Art class"));
        assert!(!art.matches("party time"));
        assert!(!art.matches("martial arts"));
    }

    #[test]
    fn test_token_set_phrase() {
        let games = TokenSet::new(&["board game"]);
        assert!(games.matches("board games night"));
        assert!(!games.matches("bored gamer"));
    }

    #[test]
    fn test_art_vibe_expands_to_classes() {
        let terms = expand_keywords("pottery and painting", "evening");
        assert_eq!(
            terms,
            vec!["art class", "painting class", "pottery class", "art studio"]
        );
    }

    #[test]
    fn test_martial_art_does_not_trigger_art() {
        let terms = expand_keywords("martial art taster", "afternoon");
        assert!(!terms.contains(&"art class".to_string()));
        assert_eq!(terms, vec!["group friendly", "fun venue"]);
    }

    #[test]
    fn test_event_type_terms_are_appended() {
        let terms = expand_keywords("board game night", "meal and drinks");
        assert_eq!(
            terms,
            vec![
                "board game cafe",
                "games night",
                "board games",
                "restaurant",
                "bar"
            ]
        );

        let terms = expand_keywords("anything", "night out");
        assert_eq!(terms, vec!["nightlife"]);
    }

    #[test]
    fn test_overlapping_rules_are_deduplicated() {
        let terms = expand_keywords("outdoor coastal walk", "day out");
        assert_eq!(
            terms,
            vec![
                "park",
                "hiking",
                "scenic walk",
                "beach",
                "coastal walk",
                "clifftop walk",
                "hiking trail",
                "day trip ideas"
            ]
        );
    }

    #[test]
    fn test_dedup_terms_drops_blanks() {
        assert_eq!(dedup_terms(["a", " ", "b", "a"]), vec!["a", "b"]);
    }
}
