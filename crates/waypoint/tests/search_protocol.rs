use std::cell::RefCell;

use serde_json::{Value, json};
use waypoint::{
    FlatHit, Language, MatchMode, NestedHit, ScoredQuery, SearchBackend, SearchConfig,
    SearchHits, SearchParams, SearchRequest, Searcher, normalize,
};

#[derive(Debug, thiserror::Error)]
#[error("index is closed")]
struct IndexClosed;

/// Serves hits when the query's mode matches, and records every request body it sees.
struct ModeBackend<H> {
    strict: Vec<H>,
    relaxed: Vec<H>,
    bodies: RefCell<Vec<Value>>,
}

impl<H> ModeBackend<H> {
    fn new(strict: Vec<H>, relaxed: Vec<H>) -> Self {
        Self {
            strict,
            relaxed,
            bodies: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.bodies.borrow().len()
    }
}

impl<H: waypoint::HitDocument + Clone> SearchBackend for ModeBackend<H> {
    type Hit = H;
    type Error = IndexClosed;

    fn execute(
        &self,
        _request: &SearchRequest,
        query: &ScoredQuery,
    ) -> Result<SearchHits<H>, IndexClosed> {
        self.bodies.borrow_mut().push(query.to_request_body());
        let hits = match query.mode() {
            MatchMode::Strict => self.strict.clone(),
            MatchMode::Relaxed => self.relaxed.clone(),
        };
        Ok(SearchHits::new(u64::try_from(hits.len()).unwrap(), hits))
    }
}

struct FailingBackend {
    calls: RefCell<usize>,
}

impl SearchBackend for FailingBackend {
    type Hit = NestedHit;
    type Error = IndexClosed;

    fn execute(
        &self,
        _request: &SearchRequest,
        _query: &ScoredQuery,
    ) -> Result<SearchHits<NestedHit>, IndexClosed> {
        *self.calls.borrow_mut() += 1;
        Err(IndexClosed)
    }
}

fn nested(value: Value) -> NestedHit {
    NestedHit::from_value(value).unwrap()
}

fn berlin() -> NestedHit {
    nested(json!({
        "osm_id": "240109189",
        "osm_key": "place",
        "osm_value": "city",
        "name": {"default": "Berlin", "de": "Berlin", "it": "Berlino"},
        "country": {"default": "Deutschland", "en": "Germany"},
        "coordinate": {"lon": 13.3888599, "lat": 52.5170365}
    }))
}

#[test]
fn strict_results_are_final() {
    let backend = ModeBackend::new(vec![berlin()], vec![]);
    let searcher = Searcher::new(&backend);

    let request = SearchRequest::new("berlin").unwrap();
    let places = searcher.search(&request).unwrap();

    assert_eq!(backend.calls(), 1);
    assert_eq!(places.len(), 1);
    assert_eq!(places.features[0].name(), Some("Berlin"));
    assert_eq!(places.features[0].property("country"), Some(&json!("Germany")));
    assert_eq!(places.features[0].property("osm_id"), Some(&json!(240_109_189)));
}

#[test]
fn relaxed_results_are_normalized_like_strict_ones() {
    let relaxed = vec![berlin()];
    let backend = ModeBackend::new(vec![], relaxed.clone());
    let searcher = Searcher::new(&backend);

    let request = SearchRequest::new("berlin mitte nord")
        .unwrap()
        .with_language(Language::It);
    let places = searcher.search(&request).unwrap();

    assert_eq!(backend.calls(), 2);
    assert_eq!(places, normalize(&relaxed, Language::It));
    assert_eq!(places.features[0].name(), Some("Berlino"));

    let bodies = backend.bodies.borrow();
    let minimum = |body: &Value| {
        body["query"]["filtered"]["query"]["multi_match"]["minimum_should_match"].clone()
    };
    assert_eq!(minimum(&bodies[0]), json!("100%"));
    assert_eq!(minimum(&bodies[1]), json!(-1));
}

#[test]
fn empty_in_both_phases_yields_an_empty_collection() {
    let backend: ModeBackend<NestedHit> = ModeBackend::new(vec![], vec![]);
    let searcher = Searcher::new(&backend);

    let places = searcher
        .search(&SearchRequest::new("atlantis").unwrap())
        .unwrap();

    assert!(places.is_empty());
    assert_eq!(backend.calls(), 2);
    assert_eq!(
        places.to_json(false).unwrap(),
        r#"{"type":"FeatureCollection","features":[]}"#
    );
}

#[test]
fn backend_failure_stops_the_protocol() {
    let backend = FailingBackend {
        calls: RefCell::new(0),
    };
    let searcher = Searcher::new(&backend);

    let result = searcher.search(&SearchRequest::new("berlin").unwrap());

    assert!(matches!(result, Err(IndexClosed)));
    assert_eq!(*backend.calls.borrow(), 1);
}

#[test]
fn location_bias_adds_proximity_scoring() {
    let backend = ModeBackend::new(vec![berlin()], vec![]);
    let searcher = Searcher::new(&backend);

    let request = SearchRequest::new("berlin")
        .unwrap()
        .with_coordinate(13.4, 52.5);
    searcher.search(&request).unwrap();

    let bodies = backend.bodies.borrow();
    let query = &bodies[0]["query"]["filtered"]["query"];
    assert!(query.get("function_score").is_some());
    assert!(query.get("multi_match").is_none());
}

#[test]
fn request_parameters_drive_the_query() {
    let backend = ModeBackend::new(vec![berlin()], vec![]);
    let config = SearchConfig::default();
    let searcher = Searcher::with_config(&backend, &config);

    let params = SearchParams {
        q: Some("berlin".to_string()),
        lang: Some("FR".to_string()),
        limit: Some("1000".to_string()),
        ..SearchParams::default()
    };
    searcher.search_params(&params).unwrap();

    let bodies = backend.bodies.borrow();
    assert_eq!(bodies[0]["size"], json!(50));

    let filters = bodies[0]["query"]["filtered"]["filter"]["or"]["filters"]
        .as_array()
        .unwrap();
    assert_eq!(filters.len(), 3);
    assert_eq!(filters[2], json!({"exists": {"field": "name.fr.raw"}}));
}

#[test]
fn flat_documents_go_through_the_same_protocol() {
    let hit = FlatHit::from_value(json!({
        "name": "Roma",
        "name_it": "Roma",
        "name_en": "Rome",
        "coordinate": "41.8933203,12.4829321",
        "osm_id": 41485
    }))
    .unwrap();
    let backend = ModeBackend::new(vec![hit], vec![]);
    let searcher = Searcher::new(&backend);

    let places = searcher.search(&SearchRequest::new("rome").unwrap()).unwrap();

    assert_eq!(places.features[0].name(), Some("Rome"));
    assert_eq!(places.features[0].coordinates(), [12.4829321, 41.8933203]);
}
