//! The two-phase search protocol.
//!
//! Every request is first sent to the backend with strict matching. Only when
//! that query reports zero hits is it sent a second time with relaxed
//! matching. There is no retry loop: backend errors from either phase are
//! returned to the caller as they are, and a strict result with at least one
//! hit is final no matter how low its scores are.

use tracing::{debug, info, instrument};

use crate::{
    config::SearchConfig,
    error::WaypointError,
    hit::HitDocument,
    normalize::{FeatureCollection, normalize},
    query::{MatchMode, QueryBuilder, ScoredQuery},
    request::{SearchParams, SearchRequest},
};

/// Hits returned by one backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHits<H> {
    /// Total number of matching documents reported by the backend.
    pub total: u64,
    /// The returned page of hits, in relevance order.
    pub hits: Vec<H>,
}

impl<H> SearchHits<H> {
    #[must_use]
    pub fn new(total: u64, hits: Vec<H>) -> Self {
        Self { total, hits }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            total: 0,
            hits: Vec::new(),
        }
    }

    /// True when the backend reported no matches at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl<H> Default for SearchHits<H> {
    fn default() -> Self {
        Self::empty()
    }
}

/// A search engine that can execute a [`ScoredQuery`].
///
/// Implementations own their connections and timeouts. Errors are returned to
/// the caller of [`Searcher`] untouched.
pub trait SearchBackend {
    type Hit: HitDocument;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run one query. `request` is available for backends that express
    /// language or location through their own request parameters.
    fn execute(
        &self,
        request: &SearchRequest,
        query: &ScoredQuery,
    ) -> Result<SearchHits<Self::Hit>, Self::Error>;
}

impl<B: SearchBackend + ?Sized> SearchBackend for &B {
    type Hit = B::Hit;
    type Error = B::Error;

    fn execute(
        &self,
        request: &SearchRequest,
        query: &ScoredQuery,
    ) -> Result<SearchHits<Self::Hit>, Self::Error> {
        (**self).execute(request, query)
    }
}

/// The hits that answered a request and the phase that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<H> {
    pub mode: MatchMode,
    pub hits: SearchHits<H>,
}

/// Drives a [`SearchBackend`] through the strict/relaxed protocol.
#[derive(Debug, Clone)]
pub struct Searcher<B> {
    backend: B,
    builder: QueryBuilder,
}

impl<B: SearchBackend> Searcher<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, &SearchConfig::default())
    }

    pub fn with_config(backend: B, config: &SearchConfig) -> Self {
        Self {
            backend,
            builder: QueryBuilder::new(config),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn query_builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// Run the protocol and return the raw hits of the deciding phase.
    #[instrument(name = "Two-Phase Search", skip_all, level = "debug",
        fields(query = %request.query_text, language = %request.language, limit = ?request.limit))]
    pub fn search_hits(&self, request: &SearchRequest) -> Result<SearchOutcome<B::Hit>, B::Error> {
        let strict = self.run_phase(request, MatchMode::Strict)?;
        if !strict.is_empty() {
            return Ok(SearchOutcome {
                mode: MatchMode::Strict,
                hits: strict,
            });
        }

        info!("Strict query matched nothing, retrying with relaxed matching");
        let relaxed = self.run_phase(request, MatchMode::Relaxed)?;
        Ok(SearchOutcome {
            mode: MatchMode::Relaxed,
            hits: relaxed,
        })
    }

    /// Run the protocol and normalize the deciding phase's hits.
    pub fn search(&self, request: &SearchRequest) -> Result<FeatureCollection, B::Error> {
        let outcome = self.search_hits(request)?;
        Ok(normalize(&outcome.hits.hits, request.language))
    }

    /// Parse raw request parameters and search.
    ///
    /// A missing query term is reported as [`WaypointError::Request`]; backend
    /// failures are wrapped in [`WaypointError::Backend`].
    pub fn search_params(&self, params: &SearchParams) -> crate::Result<FeatureCollection> {
        let request = SearchRequest::from_params(params)?;
        self.search(&request)
            .map_err(|error| WaypointError::Backend(error.into()))
    }

    fn run_phase(
        &self,
        request: &SearchRequest,
        mode: MatchMode,
    ) -> Result<SearchHits<B::Hit>, B::Error> {
        let query = self.builder.build_request(request, mode);

        let t_search = std::time::Instant::now();
        let hits = self.backend.execute(request, &query)?;
        debug!(
            ?mode,
            total = hits.total,
            num_results = hits.hits.len(),
            search_execution_seconds = t_search.elapsed().as_secs_f32(),
            "Backend query complete"
        );
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::hit::NestedHit;

    #[derive(Debug, thiserror::Error)]
    #[error("backend unavailable")]
    struct Unavailable;

    /// Answers each call from a queue of canned responses and records the queries.
    #[derive(Default)]
    struct ScriptedBackend {
        responses: RefCell<Vec<Result<SearchHits<NestedHit>, Unavailable>>>,
        seen: RefCell<Vec<ScoredQuery>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<SearchHits<NestedHit>, Unavailable>>) -> Self {
            Self {
                responses: RefCell::new(responses.into_iter().rev().collect()),
                seen: RefCell::default(),
            }
        }

        fn modes(&self) -> Vec<MatchMode> {
            self.seen.borrow().iter().map(ScoredQuery::mode).collect()
        }
    }

    impl SearchBackend for ScriptedBackend {
        type Hit = NestedHit;
        type Error = Unavailable;

        fn execute(
            &self,
            _request: &SearchRequest,
            query: &ScoredQuery,
        ) -> Result<SearchHits<NestedHit>, Unavailable> {
            self.seen.borrow_mut().push(query.clone());
            self.responses
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| Ok(SearchHits::empty()))
        }
    }

    fn place(name: &str) -> NestedHit {
        NestedHit::from_value(json!({
            "name": {"default": name},
            "coordinate": {"lon": 1.0, "lat": 2.0}
        }))
        .unwrap()
    }

    #[test]
    fn test_strict_hit_skips_relaxed_phase() {
        let backend = ScriptedBackend::new(vec![Ok(SearchHits::new(1, vec![place("Strict")]))]);
        let searcher = Searcher::new(&backend);

        let outcome = searcher
            .search_hits(&SearchRequest::new("strict").unwrap())
            .unwrap();
        assert_eq!(outcome.mode, MatchMode::Strict);
        assert_eq!(backend.modes(), vec![MatchMode::Strict]);
    }

    #[test]
    fn test_zero_hits_trigger_relaxed_phase() {
        let backend = ScriptedBackend::new(vec![
            Ok(SearchHits::empty()),
            Ok(SearchHits::new(1, vec![place("Relaxed")])),
        ]);
        let searcher = Searcher::new(&backend);

        let collection = searcher
            .search(&SearchRequest::new("relaxd").unwrap())
            .unwrap();
        assert_eq!(collection.features[0].name(), Some("Relaxed"));
        assert_eq!(backend.modes(), vec![MatchMode::Strict, MatchMode::Relaxed]);
    }

    #[test]
    fn test_both_phases_empty() {
        let backend = ScriptedBackend::default();
        let searcher = Searcher::new(&backend);

        let outcome = searcher
            .search_hits(&SearchRequest::new("nothing").unwrap())
            .unwrap();
        assert_eq!(outcome.mode, MatchMode::Relaxed);
        assert!(outcome.hits.is_empty());
        assert_eq!(backend.modes().len(), 2);
    }

    #[test]
    fn test_strict_failure_is_not_retried() {
        let backend = ScriptedBackend::new(vec![Err(Unavailable)]);
        let searcher = Searcher::new(&backend);

        let result = searcher.search(&SearchRequest::new("berlin").unwrap());
        assert!(matches!(result, Err(Unavailable)));
        assert_eq!(backend.modes(), vec![MatchMode::Strict]);
    }

    #[test]
    fn test_search_params_reports_missing_query() {
        let backend = ScriptedBackend::default();
        let searcher = Searcher::new(&backend);

        let result = searcher.search_params(&SearchParams::default());
        assert!(matches!(result, Err(WaypointError::Request(_))));
        assert!(backend.modes().is_empty());
    }

    #[test]
    fn test_search_params_wraps_backend_errors() {
        let backend = ScriptedBackend::new(vec![Err(Unavailable)]);
        let searcher = Searcher::new(&backend);
        let params = SearchParams {
            q: Some("berlin".to_string()),
            ..SearchParams::default()
        };

        let result = searcher.search_params(&params);
        assert!(matches!(result, Err(WaypointError::Backend(_))));
    }

    #[test]
    fn test_searcher_limits_apply_to_params() {
        let config = SearchConfig::builder().limits(5, 10).unwrap().build();
        let backend = ScriptedBackend::default();
        let searcher = Searcher::with_config(&backend, &config);
        let params = SearchParams {
            q: Some("berlin".to_string()),
            limit: Some("99".to_string()),
            ..SearchParams::default()
        };

        searcher.search_params(&params).unwrap();
        assert!(backend.seen.borrow().iter().all(|query| query.limit == 10));
    }

    #[test]
    fn test_searcher_limits_apply_to_typed_requests() {
        let config = SearchConfig::builder().limits(5, 10).unwrap().build();
        let backend = ScriptedBackend::default();
        let searcher = Searcher::with_config(&backend, &config);

        searcher
            .search_hits(&SearchRequest::new("berlin").unwrap())
            .unwrap();
        assert_eq!(backend.modes().len(), 2);
        assert!(backend.seen.borrow().iter().all(|query| query.limit == 5));

        let wide = SearchConfig::builder().limits(15, 200).unwrap().build();
        let backend = ScriptedBackend::default();
        let searcher = Searcher::with_config(&backend, &wide);
        searcher
            .search_hits(&SearchRequest::new("berlin").unwrap().with_limit(120))
            .unwrap();
        assert_eq!(backend.modes().len(), 2);
        assert!(backend.seen.borrow().iter().all(|query| query.limit == 120));
    }
}
