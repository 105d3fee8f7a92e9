//! Waypoint - Geocoding Search Façade
//!
//! Waypoint sits between an HTTP routing layer and a full-text search engine
//! holding a place index. It turns a free-text location query (optionally
//! biased towards a coordinate and localized to a language) into a relevance-
//! ranked GeoJSON `FeatureCollection`.
//!
//! Each request runs at most two backend queries: a strict one that requires
//! every term to match, and, only if that finds nothing, a relaxed one that
//! tolerates a missing term.
//!
//! # Quick Start
//!
//! ```rust
//! use waypoint::{
//!     FeatureCollection, NestedHit, ScoredQuery, SearchBackend, SearchHits, SearchRequest,
//!     Searcher,
//! };
//!
//! struct Fixed;
//!
//! impl SearchBackend for Fixed {
//!     type Hit = NestedHit;
//!     type Error = std::io::Error;
//!
//!     fn execute(
//!         &self,
//!         _request: &SearchRequest,
//!         _query: &ScoredQuery,
//!     ) -> Result<SearchHits<NestedHit>, std::io::Error> {
//!         let hit = NestedHit::from_value(serde_json::json!({
//!             "name": {"default": "Berlin", "de": "Berlin"},
//!             "coordinate": {"lon": 13.4, "lat": 52.5}
//!         }))?;
//!         Ok(SearchHits::new(1, vec![hit]))
//!     }
//! }
//!
//! let searcher = Searcher::new(Fixed);
//! let request = SearchRequest::new("berlin")?.with_coordinate(13.4, 52.5);
//! let places: FeatureCollection = searcher.search(&request)?;
//! assert_eq!(places.features[0].name(), Some("Berlin"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Concrete Elasticsearch and Solr backends live in the `waypoint-backends`
//! crate.
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod config;
pub mod error;
mod hit;
mod language;
mod normalize;
mod query;
mod request;
mod search;

pub use config::{
    DEFAULT_LIMIT, LimitPolicy, MAX_LIMIT, QueryConfig, SearchConfig, SearchConfigBuilder,
};
pub use error::{Result, WaypointError};
pub use hit::{Coordinate, FlatHit, HitDocument, HitError, LocaleKey, NestedHit, scalar_text};
pub use language::{AddressOrder, LANGUAGE_PROFILES, Language, LanguageProfile, resolve_localized};
pub use normalize::{
    FeatureCollection, GeoFeature, Geometry, Properties, normalize, normalize_hit,
};
pub use query::{
    BoostedField, DISTANCE_DECAY_SCRIPT, HousenumberFilter, MatchMode, ProximityScoring,
    QueryBuilder, ScoredQuery, TextClause,
};
pub use request::{RequestError, SearchParams, SearchRequest};
pub use search::{SearchBackend, SearchHits, SearchOutcome, Searcher};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for Waypoint.
///
/// `RUST_LOG` takes precedence over `level` when it is set. Calling this more
/// than once is a no-op.
///
/// ```rust
/// use tracing::Level;
/// use waypoint::init_logging;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), waypoint::WaypointError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<()> {
    LOGGER_INIT
        .get_or_try_init(|| -> Result<()> {
            let filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
                .add_directive("reqwest=warn".parse()?)
                .add_directive("hyper_util=warn".parse()?);

            tracing_subscriber::fmt::fmt()
                .with_env_filter(filter)
                .with_span_events(FmtSpan::CLOSE)
                .try_init()
                .map_err(|e| WaypointError::ConfigError(e.to_string()))
        })
        .map(|()| ())
}
