//! Inbound search requests.
//!
//! [`SearchParams`] carries the raw, untrusted query-string values exactly as a
//! routing layer received them. [`SearchRequest`] is the validated form: every
//! bad value except a missing query term is replaced by its default.

pub use error::RequestError;
use error::Result;
use serde::{Deserialize, Serialize};

use crate::{config::LimitPolicy, hit::Coordinate, language::Language};

/// Raw request parameters (`?q=berlin&lang=de&lon=13.4&lat=52.5&limit=5&debug`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub lang: Option<String>,
    pub lon: Option<String>,
    pub lat: Option<String>,
    pub limit: Option<String>,
    pub debug: Option<String>,
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query_text: String,
    pub language: Language,
    /// Location bias; `None` disables proximity scoring.
    pub coordinate: Option<Coordinate>,
    /// Requested result size, as asked. Clamped by the searcher's [`LimitPolicy`].
    pub limit: Option<i64>,
    /// Pretty-print the response.
    pub debug: bool,
}

impl SearchRequest {
    /// Create a request with default language, no location bias and no requested limit.
    pub fn new(query_text: impl Into<String>) -> Result<Self> {
        let query_text = query_text.into();
        if query_text.trim().is_empty() {
            return Err(RequestError::MissingQuery);
        }
        Ok(Self {
            query_text,
            language: Language::default(),
            coordinate: None,
            limit: None,
            debug: false,
        })
    }

    /// Parse raw parameters.
    ///
    /// Only a missing or blank `q` is an error. Unsupported languages fall back
    /// to English, a coordinate is kept only when both halves parse and are in
    /// range, and an unparseable limit counts as not requested.
    pub fn from_params(params: &SearchParams) -> Result<Self> {
        let mut request = Self::new(params.q.clone().unwrap_or_default())?;
        request.language = Language::resolve(params.lang.as_deref());
        request.coordinate = parse_coordinate(params.lon.as_deref(), params.lat.as_deref());
        request.limit = params.limit.as_deref().and_then(parse_limit);
        request.debug = params.debug.is_some();
        Ok(request)
    }

    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Bias results towards a point. Out-of-range values clear the bias.
    #[must_use]
    pub fn with_coordinate(mut self, lon: f64, lat: f64) -> Self {
        self.coordinate = Coordinate::new(lon, lat);
        self
    }

    /// Ask for a result size. Clamping happens when the query is built.
    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The result size this request gets under `limits`.
    #[must_use]
    pub fn effective_limit(&self, limits: &LimitPolicy) -> usize {
        limits.clamp(self.limit)
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

fn parse_coordinate(lon: Option<&str>, lat: Option<&str>) -> Option<Coordinate> {
    let lon = lon?.trim().parse::<f64>().ok()?;
    let lat = lat?.trim().parse::<f64>().ok()?;
    Coordinate::new(lon, lat)
}

fn parse_limit(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum RequestError {
        #[error("missing search term 'q': /?q=berlin")]
        MissingQuery,
    }
    pub type Result<T> = std::result::Result<T, RequestError>;
}
