//! HTTP search backends for Waypoint.
//!
//! [`ElasticsearchBackend`] sends the full scored query body to an index's
//! `_search` endpoint and reads nested documents. [`SolrBackend`] drives a
//! core's per-language request handlers and reads flat documents. Both are
//! synchronous: each owns a long-lived `reqwest` client and the `tokio`
//! runtime that drives it.
//!
//! Because of that runtime, a backend must not be used or dropped
//! inside another tokio runtime: tokio panics when a runtime blocks or shuts
//! down from async context. From async code, build and call the backend on a
//! dedicated thread, for example with `tokio::task::spawn_blocking`.
//!
//! ```rust,no_run
//! use waypoint::{SearchParams, Searcher};
//! use waypoint_backends::ElasticsearchBackend;
//!
//! let searcher = Searcher::new(ElasticsearchBackend::from_env()?);
//! let params = SearchParams {
//!     q: Some("berlin".to_string()),
//!     lang: Some("de".to_string()),
//!     ..SearchParams::default()
//! };
//! let places = searcher.search_params(&params)?;
//! println!("{}", places.to_json(true)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod elasticsearch;
pub mod error;
mod http;
mod solr;

pub use config::{
    DEFAULT_ELASTICSEARCH_ENDPOINT, DEFAULT_INDEX, DEFAULT_SOLR_ENDPOINT, DEFAULT_TIMEOUT,
    ELASTICSEARCH_ENDPOINT_VAR, ElasticsearchConfig, INDEX_VAR, SOLR_ENDPOINT_VAR, SolrConfig,
    TIMEOUT_VAR,
};
pub use elasticsearch::{ElasticsearchBackend, HitTotal, HitsEnvelope, RawHit, SearchResponse};
pub use error::{BackendError, Result};
pub use solr::{SelectDocs, SelectResponse, SolrBackend, select_params};
