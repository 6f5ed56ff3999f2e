use mockito::{Matcher, Server};
use serde_json::json;
use tokio_test::assert_ok;

use inspire_api::{
    error::{ProviderError, RankError},
    models::{Accessibility, CandidateKind, DateRange, Preferences, RefreshToken},
    services::{
        date_window::resolve_date_window,
        geocode::Geocoder,
        intent::NormalizedIntent,
        providers::{
            EventbriteProvider, FacebookEventsProvider, GooglePlacesProvider, MeetupProvider,
            ProviderQuery, VenueProvider,
        },
        ranker::{GeminiBackend, HuggingFaceBackend, OllamaBackend, RankingBackend},
    },
};

fn prefs(vibe: &str, event_type: &str) -> Preferences {
    Preferences {
        group_size: 6,
        location: "Leeds".to_string(),
        date_range: DateRange::explicit("2026-11-06", Some("2026-11-08")),
        vibe: vibe.to_string(),
        event_type: event_type.to_string(),
        budget_level: None,
        accessibility: Accessibility::default(),
        age_range_hint: None,
        refresh_token: None,
    }
}

fn query(prefs: &Preferences) -> ProviderQuery {
    ProviderQuery::build(
        prefs,
        &NormalizedIntent::default(),
        resolve_date_window(&prefs.date_range),
    )
}

fn json_body(value: serde_json::Value) -> String {
    value.to_string()
}

async fn geocode_mock(server: &mut Server, hits: usize) -> mockito::Mock {
    server
        .mock("GET", "/geocode/json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("address".into(), "Leeds".into()),
            Matcher::UrlEncoded("key".into(), "maps-key".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "status": "OK",
            "results": [{"geometry": {"location": {"lat": 53.8, "lng": -1.55}}}]
        })))
        .expect(hits)
        .create_async()
        .await
}

#[tokio::test]
async fn test_google_places_searches_each_phrase() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/place/textsearch/json")
        .match_query(Matcher::UrlEncoded("key".into(), "places-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "status": "OK",
            "results": [{
                "place_id": "dice-1",
                "name": "Dice Tavern",
                "types": ["cafe", "food"],
                "formatted_address": "1 Call Lane, Leeds",
                "rating": 4.7
            }]
        })))
        .expect_at_least(1)
        .create_async()
        .await;

    let provider = GooglePlacesProvider::new("places-key".to_string(), server.url());
    let candidates = provider
        .search(&query(&prefs("board game", "evening")))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(!candidates.is_empty());
    assert_eq!(candidates[0].title, "Dice Tavern");
    assert_eq!(candidates[0].category.as_deref(), Some("cafe"));
    assert_eq!(candidates[0].external.source_id.as_deref(), Some("dice-1"));
}

#[tokio::test]
async fn test_google_places_denied_is_a_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex("^/place/textsearch/json".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        })))
        .create_async()
        .await;

    let provider = GooglePlacesProvider::new("bad-key".to_string(), server.url());
    let error = provider
        .search(&query(&prefs("karaoke", "evening")))
        .await
        .unwrap_err();

    assert!(matches!(error, ProviderError::Upstream(_)));
    assert!(!error.is_transient());
}

#[tokio::test]
async fn test_eventbrite_sends_window_and_breadth() {
    let mut server = Server::new_async().await;
    let mut prefs = prefs("live music", "evening");
    prefs.refresh_token = Some(RefreshToken::Number(1));

    let mock = server
        .mock("GET", "/events/search/")
        .match_header("authorization", "Bearer eb-key")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("location.address".into(), "Leeds".into()),
            Matcher::UrlEncoded("location.within".into(), "70km".into()),
            Matcher::UrlEncoded("page".into(), "2".into()),
            Matcher::UrlEncoded("start_date.range_start".into(), "2026-11-06T00:00:00".into()),
            Matcher::UrlEncoded("start_date.range_end".into(), "2026-11-08T23:59:59".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "events": [{
                "id": "eb-1",
                "name": {"text": "Indie Night"},
                "url": "https://eventbrite.test/e/eb-1",
                "is_free": true,
                "venue": {"name": "Brudenell Social Club", "latitude": "53.81", "longitude": "-1.58"}
            }]
        })))
        .create_async()
        .await;

    let provider = EventbriteProvider::new("eb-key".to_string(), server.url());
    let candidates = provider.search(&query(&prefs)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].kind, CandidateKind::Event);
    assert_eq!(candidates[0].rough_price.as_deref(), Some("Free"));
    assert_eq!(candidates[0].location.lng, Some(-1.58));
}

#[tokio::test]
async fn test_eventbrite_not_found_is_permanent() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex("^/events/search/".to_string()))
        .with_status(404)
        .with_body("NOT_FOUND")
        .create_async()
        .await;

    let provider = EventbriteProvider::new("eb-key".to_string(), server.url());
    let error = provider
        .search(&query(&prefs("live music", "evening")))
        .await
        .unwrap_err();

    assert!(matches!(error, ProviderError::Status { status: 404, .. }));
    assert!(!error.is_transient());
}

#[tokio::test]
async fn test_meetup_uses_geocoded_centre() {
    let mut server = Server::new_async().await;
    let geocode = geocode_mock(&mut server, 1).await;
    let meetup = server
        .mock("GET", "/find/upcoming_events")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("key".into(), "mu-key".into()),
            Matcher::UrlEncoded("lat".into(), "53.8".into()),
            Matcher::UrlEncoded("lon".into(), "-1.55".into()),
            Matcher::UrlEncoded("radius".into(), "50".into()),
            Matcher::UrlEncoded("order".into(), "time".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "events": [{"id": 77, "name": "Leeds Boardgamers", "fee": {"amount": 0}}]
        })))
        .create_async()
        .await;

    let geocoder = Geocoder::new(Some("maps-key".to_string()), server.url());
    let provider = MeetupProvider::new("mu-key".to_string(), server.url(), geocoder);
    let candidates = assert_ok!(provider.search(&query(&prefs("board games", "evening"))).await);

    geocode.assert_async().await;
    meetup.assert_async().await;
    assert_eq!(candidates[0].id, "77");
    assert_eq!(candidates[0].rough_price.as_deref(), Some("Free"));
}

#[tokio::test]
async fn test_facebook_sends_unix_window() {
    let mut server = Server::new_async().await;
    let _geocode = geocode_mock(&mut server, 1).await;
    let window = resolve_date_window(&DateRange::explicit("2026-11-06", Some("2026-11-08"))).unwrap();

    let graph = server
        .mock("GET", "/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("type".into(), "event".into()),
            Matcher::UrlEncoded("center".into(), "53.8,-1.55".into()),
            Matcher::UrlEncoded("distance".into(), "50000".into()),
            Matcher::UrlEncoded("since".into(), window.start.timestamp().to_string()),
            Matcher::UrlEncoded("until".into(), window.end.timestamp().to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "data": [{"id": "fb-1", "name": "Comedy Night", "category": "COMEDY_PERFORMANCE"}]
        })))
        .create_async()
        .await;

    let geocoder = Geocoder::new(Some("maps-key".to_string()), server.url());
    let provider = FacebookEventsProvider::new("fb-token".to_string(), server.url(), geocoder);
    let candidates = assert_ok!(provider.search(&query(&prefs("comedy", "evening"))).await);

    graph.assert_async().await;
    assert_eq!(candidates[0].category.as_deref(), Some("COMEDY_PERFORMANCE"));
}

#[tokio::test]
async fn test_geocoder_caches_lookups() {
    let mut server = Server::new_async().await;
    let mock = geocode_mock(&mut server, 1).await;
    let geocoder = Geocoder::new(Some("maps-key".to_string()), server.url());

    let first = geocoder.locate("Leeds").await;
    let second = geocoder.locate("  LEEDS ").await;

    mock.assert_async().await;
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_geocoder_failure_is_none() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex("^/geocode/json".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({"status": "ZERO_RESULTS", "results": []})))
        .create_async()
        .await;

    let geocoder = Geocoder::new(Some("maps-key".to_string()), server.url());
    assert_eq!(geocoder.locate("Nowhere-on-Sea").await, None);
}

#[tokio::test]
async fn test_ollama_envelope() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .match_body(Matcher::PartialJson(json!({"model": "llama3", "stream": false})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({"response": "{\"suggestions\": []}"})))
        .create_async()
        .await;

    let backend = OllamaBackend::new(server.url(), "llama3".to_string());
    let text = backend.generate("rank these").await.unwrap();

    mock.assert_async().await;
    assert_eq!(text, "{\"suggestions\": []}");
}

#[tokio::test]
async fn test_huggingface_sends_bearer_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/tiiuae/falcon-7b-instruct")
        .match_header("authorization", "Bearer hf-token")
        .match_body(Matcher::PartialJson(json!({
            "parameters": {"max_new_tokens": 400}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!([{"generated_text": "{\"suggestions\": []}"}])))
        .create_async()
        .await;

    let backend = HuggingFaceBackend::new(
        "hf-token".to_string(),
        "tiiuae/falcon-7b-instruct".to_string(),
        server.url(),
    );
    let text = backend.generate("rank these").await.unwrap();

    mock.assert_async().await;
    assert_eq!(text, "{\"suggestions\": []}");
}

#[tokio::test]
async fn test_gemini_rate_limit_is_transient() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/models/gemini-1.5-flash:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "gm-key".into()))
        .with_status(429)
        .with_body("RESOURCE_EXHAUSTED")
        .create_async()
        .await;

    let backend = GeminiBackend::new(
        "gm-key".to_string(),
        "gemini-1.5-flash".to_string(),
        server.url(),
    );
    let error = backend.generate("rank these").await.unwrap_err();

    assert!(matches!(error, RankError::Status { status: 429, .. }));
    assert!(error.is_transient());
}

#[tokio::test]
async fn test_google_places_broadens_to_art_class_search() {
    let mut server = Server::new_async().await;
    let phrases = server
        .mock("GET", "/place/textsearch/json")
        .match_query(Matcher::Regex(r"query=[^&]*\+Leeds&".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({"status": "ZERO_RESULTS", "results": []})))
        .expect_at_least(1)
        .create_async()
        .await;
    let broader = server
        .mock("GET", "/place/textsearch/json")
        .match_query(Matcher::UrlEncoded("query".into(), "Leeds art class".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({
            "status": "OK",
            "results": [
                {"place_id": "studio-9", "name": "Studio Nine", "types": ["school"]},
                {"place_id": "studio-9", "name": "Studio Nine", "types": ["school"]}
            ]
        })))
        .expect(1)
        .create_async()
        .await;

    let provider = GooglePlacesProvider::new("places-key".to_string(), server.url());
    let candidates = assert_ok!(provider.search(&query(&prefs("painting", "afternoon"))).await);

    phrases.assert_async().await;
    broader.assert_async().await;
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].title, "Studio Nine");
}

#[tokio::test]
async fn test_google_places_failed_broader_search_is_empty() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/place/textsearch/json")
        .match_query(Matcher::Regex(r"query=[^&]*\+Leeds&".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json_body(json!({"status": "ZERO_RESULTS", "results": []})))
        .create_async()
        .await;
    server
        .mock("GET", "/place/textsearch/json")
        .match_query(Matcher::UrlEncoded("query".into(), "Leeds art class".into()))
        .with_status(500)
        .with_body("backend error")
        .create_async()
        .await;

    let provider = GooglePlacesProvider::new("places-key".to_string(), server.url());
    let candidates = assert_ok!(provider.search(&query(&prefs("pottery class", "afternoon"))).await);

    assert!(candidates.is_empty());
}
