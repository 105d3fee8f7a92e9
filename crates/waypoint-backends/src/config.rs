use std::time::Duration;

/// Per-call timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_ELASTICSEARCH_ENDPOINT: &str = "http://localhost:9200";
pub const DEFAULT_INDEX: &str = "photon";
/// Solr endpoints include the core.
pub const DEFAULT_SOLR_ENDPOINT: &str = "http://localhost:8983/solr/testing";

pub const ELASTICSEARCH_ENDPOINT_VAR: &str = "ELASTICSEARCH_ENDPOINT";
pub const SOLR_ENDPOINT_VAR: &str = "SOLR_ENDPOINT";
pub const INDEX_VAR: &str = "SEARCH_INDEX";
pub const TIMEOUT_VAR: &str = "BACKEND_TIMEOUT_SECS";

/// Connection settings for the Elasticsearch backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElasticsearchConfig {
    pub endpoint: String,
    pub index: String,
    pub timeout: Duration,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ELASTICSEARCH_ENDPOINT.to_string(),
            index: DEFAULT_INDEX.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ElasticsearchConfig {
    pub fn new(endpoint: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            index: index.into(),
            ..Self::default()
        }
    }

    /// Read `ELASTICSEARCH_ENDPOINT`, `SEARCH_INDEX` and `BACKEND_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`], with variables resolved through `lookup`.
    /// Unset, blank or unparseable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            endpoint: non_blank(lookup(ELASTICSEARCH_ENDPOINT_VAR)).unwrap_or(defaults.endpoint),
            index: non_blank(lookup(INDEX_VAR)).unwrap_or(defaults.index),
            timeout: parse_timeout(lookup(TIMEOUT_VAR)).unwrap_or(defaults.timeout),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{endpoint}/{index}/_search`
    pub fn search_url(&self) -> String {
        format!(
            "{}/{}/_search",
            self.endpoint.trim_end_matches('/'),
            self.index.trim_matches('/')
        )
    }
}

/// Connection settings for the Solr backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolrConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SOLR_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SolrConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Read `SOLR_ENDPOINT` and `BACKEND_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            endpoint: non_blank(lookup(SOLR_ENDPOINT_VAR)).unwrap_or(defaults.endpoint),
            timeout: parse_timeout(lookup(TIMEOUT_VAR)).unwrap_or(defaults.timeout),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{endpoint}/select`
    pub fn select_url(&self) -> String {
        format!("{}/select", self.endpoint.trim_end_matches('/'))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_timeout(value: Option<String>) -> Option<Duration> {
    let seconds: f64 = value?.trim().parse().ok()?;
    if seconds <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}
