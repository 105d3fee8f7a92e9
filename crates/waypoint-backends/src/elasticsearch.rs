//! Elasticsearch backend: the scored query is POSTed as-is to `_search`.

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use waypoint::{NestedHit, ScoredQuery, SearchBackend, SearchHits, SearchRequest};

use crate::{
    config::ElasticsearchConfig,
    error::{BackendError, Result},
    http::BlockingTransport,
};

/// `hits.total` is a bare number on older clusters and `{ "value": n, .. }` on newer ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum HitTotal {
    Count(u64),
    Detailed { value: u64 },
}

impl HitTotal {
    #[must_use]
    pub fn value(self) -> u64 {
        match self {
            Self::Count(value) | Self::Detailed { value } => value,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHit {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_source", default)]
    pub source: Option<NestedHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitsEnvelope {
    #[serde(default)]
    pub total: Option<HitTotal>,
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

/// The parts of a `_search` response the searcher needs.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub hits: HitsEnvelope,
}

impl SearchResponse {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Unwrap the `_source` documents, keeping their order.
    ///
    /// Hits without a source are dropped. A missing total is taken from the
    /// number of returned hits.
    pub fn into_hits(self) -> SearchHits<NestedHit> {
        let returned = self.hits.hits.len() as u64;
        let total = self.hits.total.map_or(returned, HitTotal::value);
        let hits = self
            .hits
            .hits
            .into_iter()
            .filter_map(|hit| {
                if hit.source.is_none() {
                    warn!(id = ?hit.id, "Dropping hit without _source");
                }
                hit.source
            })
            .collect();
        SearchHits::new(total, hits)
    }
}

/// Runs queries against one Elasticsearch index.
#[derive(Debug)]
pub struct ElasticsearchBackend {
    config: ElasticsearchConfig,
    transport: BlockingTransport,
}

impl ElasticsearchBackend {
    pub fn new(config: ElasticsearchConfig) -> Result<Self> {
        let transport = BlockingTransport::new(config.timeout)?;
        Ok(Self { config, transport })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ElasticsearchConfig::from_env())
    }

    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }
}

impl SearchBackend for ElasticsearchBackend {
    type Hit = NestedHit;
    type Error = BackendError;

    #[instrument(name = "Elasticsearch Search", skip_all, level = "debug",
        fields(index = %self.config.index, mode = ?query.mode(), size = query.limit))]
    fn execute(
        &self,
        request: &SearchRequest,
        query: &ScoredQuery,
    ) -> Result<SearchHits<NestedHit>> {
        let body = query.to_request_body();
        if request.debug {
            info!(%body, "Search request body");
        } else {
            debug!(%body, "Search request body");
        }

        let http_request = self
            .transport
            .client()
            .post(self.config.search_url())
            .json(&body);
        let response: SearchResponse = self.transport.send_json(http_request)?;
        Ok(response.into_hits())
    }
}
