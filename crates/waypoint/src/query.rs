//! Construction of the ranked backend query.
//!
//! A [`ScoredQuery`] has three parts:
//!
//! - a fuzzy multi-field text clause over the per-language name and collector
//!   fields, strict (every term) or relaxed (all terms but one),
//! - an optional `function_score` wrapper, present only when the request
//!   carries a coordinate, that multiplies the text score by a distance decay
//!   and an importance boost,
//! - a housenumber filter that is always applied and never affects scoring.
//!
//! [`ScoredQuery::to_request_body`] renders it as the nested JSON request body.

use std::fmt;

use serde_json::{Value, json};
use tracing::{instrument, trace};

use crate::{
    config::{LimitPolicy, QueryConfig, SearchConfig},
    hit::Coordinate,
    language::Language,
    request::SearchRequest,
};

/// Decay factor, evaluated by the backend per document.
pub const DISTANCE_DECAY_SCRIPT: &str = "dist = doc['coordinate'].distanceInKm(lat, lon); 1 / (0.5 - 0.5 * exp(-5*dist/maxDist))";

/// How many query terms must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Every term has to match.
    Strict,
    /// All terms but one have to match.
    Relaxed,
}

impl MatchMode {
    #[must_use]
    pub fn from_match_all(match_all: bool) -> Self {
        if match_all { Self::Strict } else { Self::Relaxed }
    }

    #[must_use]
    pub fn match_all(self) -> bool {
        self == Self::Strict
    }

    /// The backend's `minimum_should_match` value.
    #[must_use]
    pub fn minimum_should_match(self) -> Value {
        match self {
            Self::Strict => json!("100%"),
            Self::Relaxed => json!(-1),
        }
    }
}

/// A field path with an optional boost, rendered as `path^boost`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoostedField {
    pub path: String,
    pub boost: Option<f32>,
}

impl BoostedField {
    fn new(path: String, boost: Option<f32>) -> Self {
        Self { path, boost }
    }
}

impl fmt::Display for BoostedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.boost {
            Some(boost) => write!(f, "{}^{boost}", self.path),
            None => f.write_str(&self.path),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextClause {
    pub query: String,
    pub fields: Vec<BoostedField>,
    pub fuzziness: u8,
    pub prefix_length: u8,
    pub analyzer: String,
    pub mode: MatchMode,
}

impl TextClause {
    fn to_json(&self) -> Value {
        json!({
            "multi_match": {
                "query": self.query,
                "type": "best_fields",
                "analyzer": self.analyzer,
                "minimum_should_match": self.mode.minimum_should_match(),
                "fields": self.fields.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "fuzziness": self.fuzziness,
                "prefix_length": self.prefix_length,
            }
        })
    }
}

/// Location bias: text score × distance decay × importance boost.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityScoring {
    pub origin: Coordinate,
    pub horizon_km: f64,
    pub importance_weight: f64,
}

impl ProximityScoring {
    #[must_use]
    pub fn importance_script(&self) -> String {
        format!("1 + doc['importance'].value * {}", self.importance_weight)
    }

    fn wrap(&self, inner: Value) -> Value {
        json!({
            "function_score": {
                "score_mode": "multiply",
                "boost_mode": "multiply",
                "query": inner,
                "functions": [
                    {
                        "script_score": {
                            "script": DISTANCE_DECAY_SCRIPT,
                            "params": {
                                "lon": self.origin.lon,
                                "lat": self.origin.lat,
                                "maxDist": self.horizon_km,
                            }
                        }
                    },
                    {
                        "script_score": {
                            "script": self.importance_script(),
                        }
                    }
                ]
            }
        })
    }
}

/// Keeps a hit when it has no housenumber, when its housenumber matches the
/// query text, or when it has a name of its own in the requested language.
#[derive(Debug, Clone, PartialEq)]
pub struct HousenumberFilter {
    pub query: String,
    pub analyzer: String,
    pub name_field: String,
}

impl HousenumberFilter {
    fn to_json(&self) -> Value {
        json!({
            "or": {
                "filters": [
                    { "missing": { "field": "housenumber" } },
                    {
                        "query": {
                            "match": {
                                "housenumber": {
                                    "query": self.query,
                                    "analyzer": self.analyzer,
                                }
                            }
                        }
                    },
                    { "exists": { "field": self.name_field } }
                ]
            }
        })
    }
}

/// The composed backend query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredQuery {
    pub text: TextClause,
    pub scoring: Option<ProximityScoring>,
    pub filter: HousenumberFilter,
    pub limit: usize,
}

impl ScoredQuery {
    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.text.mode
    }

    /// Render the query as the backend's JSON request body.
    #[must_use]
    pub fn to_request_body(&self) -> Value {
        let text = self.text.to_json();
        let scored = match &self.scoring {
            Some(scoring) => scoring.wrap(text),
            None => text,
        };
        json!({
            "query": {
                "filtered": {
                    "query": scored,
                    "filter": self.filter.to_json(),
                }
            },
            "size": self.limit,
        })
    }
}

/// Builds [`ScoredQuery`]s from request parts.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    config: QueryConfig,
    limits: LimitPolicy,
}

impl QueryBuilder {
    #[must_use]
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            config: config.query.clone(),
            limits: config.limits,
        }
    }

    #[must_use]
    pub fn limits(&self) -> &LimitPolicy {
        &self.limits
    }

    /// Build a query for a validated request, sizing it with this builder's limits.
    #[must_use]
    pub fn build_request(&self, request: &SearchRequest, mode: MatchMode) -> ScoredQuery {
        self.build(
            &request.query_text,
            request.language,
            request.coordinate,
            mode,
            request.effective_limit(&self.limits),
        )
    }

    /// Build a query. Never fails; `limit` is clamped to the configured bounds.
    #[instrument(name = "Build Scored Query",
        skip_all, level = "trace", fields(mode = ?mode, limit = limit))]
    #[must_use]
    pub fn build(
        &self,
        query_text: &str,
        language: Language,
        coordinate: Option<Coordinate>,
        mode: MatchMode,
        limit: usize,
    ) -> ScoredQuery {
        let text = TextClause {
            query: query_text.to_string(),
            fields: self.text_fields(language),
            fuzziness: self.config.fuzziness,
            prefix_length: self.config.prefix_length,
            analyzer: self.config.analyzer.clone(),
            mode,
        };

        let scoring = coordinate.map(|origin| ProximityScoring {
            origin,
            horizon_km: self.config.horizon_km,
            importance_weight: self.config.importance_weight,
        });

        let filter = HousenumberFilter {
            query: query_text.to_string(),
            analyzer: self.config.housenumber_analyzer.clone(),
            name_field: format!("name.{language}.raw"),
        };

        let query = ScoredQuery {
            text,
            scoring,
            filter,
            limit: self
                .limits
                .clamp(Some(i64::try_from(limit).unwrap_or(i64::MAX))),
        };
        trace!(?query, "Scored query constructed");
        query
    }

    fn text_fields(&self, language: Language) -> Vec<BoostedField> {
        vec![
            BoostedField::new(
                format!("name.{language}.ngramed"),
                Some(self.config.ngram_boost),
            ),
            BoostedField::new(format!("name.{language}.raw"), Some(self.config.raw_boost)),
            BoostedField::new(format!("collector.{language}.raw"), None),
            BoostedField::new(format!("collector.{language}"), None),
        ]
    }
}
