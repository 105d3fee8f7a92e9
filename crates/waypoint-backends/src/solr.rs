//! Solr backend.
//!
//! Solr cores carry their own ranking in per-language request handlers, so
//! only the query text, size, language, location and match strictness of a
//! [`ScoredQuery`] are sent, as `select` parameters. Documents come back flat.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use waypoint::{FlatHit, ScoredQuery, SearchBackend, SearchHits, SearchRequest};

use crate::{
    config::SolrConfig,
    error::{BackendError, Result},
    http::BlockingTransport,
};

/// Build the `select` parameters for one query.
///
/// The request handler is `{lang}_loc` with a `pt=lat,lon` point when the
/// request is location-biased and `{lang}` otherwise.
pub fn select_params(request: &SearchRequest, query: &ScoredQuery) -> Vec<(&'static str, String)> {
    let language = request.language;
    let mut params = vec![
        ("q", query.text.query.clone()),
        ("wt", "json".to_string()),
        ("rows", query.limit.to_string()),
    ];

    match request.coordinate {
        Some(point) => {
            params.push(("qt", format!("{language}_loc")));
            params.push(("pt", format!("{},{}", point.lat, point.lon)));
        }
        None => params.push(("qt", language.code().to_string())),
    }

    let mm = match query.mode().minimum_should_match() {
        Value::String(text) => text,
        other => other.to_string(),
    };
    params.push(("mm", mm));
    params
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectDocs {
    #[serde(rename = "numFound")]
    pub num_found: u64,
    #[serde(default)]
    pub docs: Vec<FlatHit>,
}

/// The parts of a `select` response the searcher needs.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectResponse {
    pub response: SelectDocs,
}

impl SelectResponse {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn into_hits(self) -> SearchHits<FlatHit> {
        SearchHits::new(self.response.num_found, self.response.docs)
    }
}

/// Runs queries against one Solr core.
#[derive(Debug)]
pub struct SolrBackend {
    config: SolrConfig,
    transport: BlockingTransport,
}

impl SolrBackend {
    pub fn new(config: SolrConfig) -> Result<Self> {
        let transport = BlockingTransport::new(config.timeout)?;
        Ok(Self { config, transport })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(SolrConfig::from_env())
    }

    pub fn config(&self) -> &SolrConfig {
        &self.config
    }
}

impl SearchBackend for SolrBackend {
    type Hit = FlatHit;
    type Error = BackendError;

    #[instrument(name = "Solr Search", skip_all, level = "debug",
        fields(endpoint = %self.config.endpoint, mode = ?query.mode(), rows = query.limit))]
    fn execute(&self, request: &SearchRequest, query: &ScoredQuery) -> Result<SearchHits<FlatHit>> {
        let params = select_params(request, query);
        debug!(?params, "Select parameters");

        let http_request = self
            .transport
            .client()
            .get(self.config.select_url())
            .query(&params);
        let response: SelectResponse = self.transport.send_json(http_request)?;
        Ok(response.into_hits())
    }
}
