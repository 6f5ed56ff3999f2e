//! Tiered degradation from ranked output down to a built-in catalog
//!
//! Each tier only runs when the previous one produced nothing, so a request
//! always ends with a best-effort list instead of an error.

use std::sync::LazyLock;

use crate::{
    models::{
        Candidate, CandidateKind, ExternalRef, Location, Preferences, RecommendedFlow, Suggestion,
        MAX_SUGGESTIONS,
    },
    services::{keywords::TokenSet, providers::google_places::map_search_url},
};

/// Which tier produced the final list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTier {
    Ranked,
    RawCandidates,
    StaticCatalog,
}

struct CatalogEntry {
    id: &'static str,
    title: &'static str,
    category: &'static str,
    map_query: &'static str,
    why: &'static str,
}

static LIVE_MUSIC: CatalogEntry = CatalogEntry {
    id: "static-live-music",
    title: "Live Music Venue",
    category: "music_venue",
    map_query: "live music venue",
    why: "Live sets give the group something to share without much planning.",
};

static BOARD_GAME_CAFE: CatalogEntry = CatalogEntry {
    id: "static-board-game-cafe",
    title: "Board Game Cafe",
    category: "cafe",
    map_query: "board game cafe",
    why: "Hundreds of games on the shelf and staff to teach the rules.",
};

static BASE_CATALOG: [CatalogEntry; 3] = [
    CatalogEntry {
        id: "static-pub",
        title: "Local Pub",
        category: "bar",
        map_query: "pub",
        why: "Easy to book a big table and works for most budgets.",
    },
    CatalogEntry {
        id: "static-restaurant",
        title: "Group-Friendly Restaurant",
        category: "restaurant",
        map_query: "group friendly restaurant",
        why: "Shared plates and set menus keep a group meal simple.",
    },
    CatalogEntry {
        id: "static-outdoor-walk",
        title: "Scenic Outdoor Walk",
        category: "park",
        map_query: "scenic walk",
        why: "Free, flexible and easy to fit around everyone's timings.",
    },
];

static LIVE_MUSIC_TOKENS: LazyLock<TokenSet> =
    LazyLock::new(|| TokenSet::new(&["live music", "gig", "concert"]));
static BOARD_GAME_TOKENS: LazyLock<TokenSet> =
    LazyLock::new(|| TokenSet::new(&["board game", "tabletop", "chess", "games night"]));

fn date_fit(prefs: &Preferences) -> String {
    let label = prefs.date_label();
    if label.trim().is_empty() {
        "Within your time window".to_string()
    } else {
        label
    }
}

fn group_fit(prefs: &Preferences) -> String {
    format!("Good for {} people.", prefs.group_size)
}

/// Final suggestion list for a request, with the tier that produced it.
pub fn resolve(
    prefs: &Preferences,
    ranked: Vec<Suggestion>,
    candidates: &[Candidate],
) -> (FallbackTier, Vec<Suggestion>) {
    if !ranked.is_empty() {
        let mut ranked = ranked;
        ranked.truncate(MAX_SUGGESTIONS);
        return (FallbackTier::Ranked, ranked);
    }
    if !candidates.is_empty() {
        return (FallbackTier::RawCandidates, project_candidates(prefs, candidates));
    }
    (FallbackTier::StaticCatalog, static_catalog(prefs))
}

/// Projects the first candidates directly into suggestions.
pub fn project_candidates(prefs: &Preferences, candidates: &[Candidate]) -> Vec<Suggestion> {
    candidates
        .iter()
        .take(MAX_SUGGESTIONS)
        .enumerate()
        .map(|(index, candidate)| Suggestion {
            id: if candidate.id.is_empty() {
                format!("direct-{}", index)
            } else {
                candidate.id.clone()
            },
            title: candidate.title.clone(),
            category: candidate.category.clone(),
            kind: candidate.kind,
            recommended_flow: RecommendedFlow::General,
            location: candidate.location.clone(),
            external: candidate.external.clone(),
            date_fit_summary: Some(date_fit(prefs)),
            group_fit_summary: Some(group_fit(prefs)),
            why_suitable: Some(
                candidate
                    .description
                    .clone()
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| format!("Matches your vibe: {}", prefs.vibe)),
            ),
            rough_price: candidate.rough_price.clone(),
            image_url: None,
        })
        .collect()
}

/// Built-in suggestions for when no provider produced anything.
///
/// Pub, restaurant and outdoor walk always appear; a live-music or board-game
/// entry leads the list when the vibe asks for one.
pub fn static_catalog(prefs: &Preferences) -> Vec<Suggestion> {
    let vibe = prefs.vibe.to_lowercase();
    let featured = if LIVE_MUSIC_TOKENS.matches(&vibe) {
        Some(&LIVE_MUSIC)
    } else if BOARD_GAME_TOKENS.matches(&vibe) {
        Some(&BOARD_GAME_CAFE)
    } else {
        None
    };

    let flow = RecommendedFlow::for_event_type(&prefs.event_type);
    let location = prefs.location.trim();

    featured
        .into_iter()
        .chain(BASE_CATALOG.iter())
        .map(|entry| Suggestion {
            id: entry.id.to_string(),
            title: entry.title.to_string(),
            category: Some(entry.category.to_string()),
            kind: CandidateKind::Venue,
            recommended_flow: flow,
            location: Location {
                name: Some(location.to_string()),
                ..Location::default()
            },
            external: ExternalRef {
                source: Some("google_maps".to_string()),
                url: Some(map_search_url(
                    &format!("{} {}", entry.map_query, location),
                    None,
                )),
                source_id: None,
            },
            date_fit_summary: Some(date_fit(prefs)),
            group_fit_summary: Some(group_fit(prefs)),
            why_suitable: Some(entry.why.to_string()),
            rough_price: None,
            image_url: None,
        })
        .collect()
}
