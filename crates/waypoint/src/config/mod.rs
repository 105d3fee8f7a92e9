use crate::error::WaypointError;

/// Result size used when a request does not ask for one (or asks for nonsense).
pub const DEFAULT_LIMIT: usize = 15;
/// Largest result size a request may ask for.
pub const MAX_LIMIT: usize = 50;

/// How requested result sizes are turned into the size sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    pub default: usize,
    pub max: usize,
}

impl LimitPolicy {
    /// Clamp a requested limit: absent or below one becomes the default,
    /// anything above the maximum becomes the maximum.
    #[must_use]
    pub fn clamp(&self, requested: Option<i64>) -> usize {
        match requested {
            Some(limit) if limit >= 1 => {
                usize::try_from(limit).map_or(self.max, |limit| limit.min(self.max))
            }
            _ => self.default,
        }
    }
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self {
            default: DEFAULT_LIMIT,
            max: MAX_LIMIT,
        }
    }
}

/// Tuning knobs for the text clause and the proximity scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// Weight of the n-gram name field.
    pub ngram_boost: f32,
    /// Weight of the exact (raw) name field.
    pub raw_boost: f32,
    /// Maximum edit distance per term.
    pub fuzziness: u8,
    /// Number of leading characters that must match exactly before fuzziness applies.
    pub prefix_length: u8,
    /// Search-time analyzer for the text clause.
    pub analyzer: String,
    /// Analyzer used when matching the query against housenumbers.
    pub housenumber_analyzer: String,
    /// Distance (km) over which the proximity factor decays.
    pub horizon_km: f64,
    /// Multiplier applied to the per-place importance score.
    pub importance_weight: f64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            ngram_boost: 3.0,
            raw_boost: 10.0,
            fuzziness: 1,
            prefix_length: 3,
            analyzer: "search_stringanalyser".to_string(),
            housenumber_analyzer: "standard".to_string(),
            horizon_km: 100.0,
            importance_weight: 40.0,
        }
    }
}

/// Configuration for the search façade.
///
/// Use [`SearchConfigBuilder`] for an ergonomic way to create one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchConfig {
    pub limits: LimitPolicy,
    pub query: QueryConfig,
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }
}

/// Builder for creating search configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Create a new builder with sensible defaults
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    /// Create a builder that disables typo tolerance (exact term matching only)
    pub fn exact() -> Self {
        let mut builder = Self::new();
        builder.config.query.fuzziness = 0;
        builder
    }

    /// Set the default and maximum result sizes
    pub fn limits(mut self, default: usize, max: usize) -> Result<Self, WaypointError> {
        if default == 0 || max == 0 || default > max {
            return Err(WaypointError::ConfigError(format!(
                "Limits must satisfy 1 <= default <= max, got default={default} max={max}"
            )));
        }
        self.config.limits = LimitPolicy { default, max };
        Ok(self)
    }

    /// Set the weights of the n-gram and exact name fields
    pub fn field_boosts(mut self, ngram: f32, raw: f32) -> Result<Self, WaypointError> {
        if !(ngram > 0.0 && raw > 0.0) {
            return Err(WaypointError::ConfigError(format!(
                "Field boosts must be positive, got ngram={ngram} raw={raw}"
            )));
        }
        self.config.query.ngram_boost = ngram;
        self.config.query.raw_boost = raw;
        Ok(self)
    }

    /// Set the per-term edit distance (the backend accepts at most 2)
    pub fn fuzziness(mut self, fuzziness: u8) -> Self {
        self.config.query.fuzziness = fuzziness.min(2);
        self
    }

    /// Set how many leading characters are exempt from fuzzy matching
    pub fn prefix_length(mut self, prefix_length: u8) -> Self {
        self.config.query.prefix_length = prefix_length;
        self
    }

    /// Set the search-time analyzer of the text clause
    pub fn analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.config.query.analyzer = analyzer.into();
        self
    }

    /// Configure location-biased scoring
    pub fn proximity(
        mut self,
        horizon_km: f64,
        importance_weight: f64,
    ) -> Result<Self, WaypointError> {
        if !(horizon_km.is_finite() && horizon_km > 0.0) {
            return Err(WaypointError::ConfigError(format!(
                "Distance horizon must be a positive number of kilometres, got {horizon_km}"
            )));
        }
        if !(importance_weight.is_finite() && importance_weight >= 0.0) {
            return Err(WaypointError::ConfigError(format!(
                "Importance weight must be non-negative, got {importance_weight}"
            )));
        }
        self.config.query.horizon_km = horizon_km;
        self.config.query.importance_weight = importance_weight;
        Ok(self)
    }

    /// Build the final configuration
    pub fn build(self) -> SearchConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_builder() {
        let config = SearchConfigBuilder::new().build();
        assert_eq!(config.limits.default, 15);
        assert_eq!(config.limits.max, 50);
        assert_eq!(config.query.fuzziness, 1);
        assert_eq!(config.query.prefix_length, 3);
        assert_eq!(config, SearchConfig::default());
    }

    #[test]
    fn test_limit_clamping() {
        let limits = LimitPolicy::default();
        assert_eq!(limits.clamp(Some(1000)), 50);
        assert_eq!(limits.clamp(Some(0)), 15);
        assert_eq!(limits.clamp(Some(-3)), 15);
        assert_eq!(limits.clamp(None), 15);
        assert_eq!(limits.clamp(Some(1)), 1);
        assert_eq!(limits.clamp(Some(50)), 50);
        assert_eq!(limits.clamp(Some(i64::MAX)), 50);
    }

    #[test]
    fn test_exact_preset() {
        let config = SearchConfigBuilder::exact().build();
        assert_eq!(config.query.fuzziness, 0);
        assert_eq!(config.query.prefix_length, 3);
    }

    #[test]
    fn test_method_chaining() {
        let config = SearchConfigBuilder::new()
            .fuzziness(5)
            .prefix_length(2)
            .analyzer("simple")
            .limits(10, 20)
            .unwrap()
            .proximity(25.0, 10.0)
            .unwrap()
            .build();

        assert_eq!(config.query.fuzziness, 2);
        assert_eq!(config.query.prefix_length, 2);
        assert_eq!(config.query.analyzer, "simple");
        assert_eq!(config.limits, LimitPolicy { default: 10, max: 20 });
        assert_eq!(config.query.horizon_km, 25.0);
        assert_eq!(config.query.importance_weight, 10.0);
    }

    #[test]
    fn test_validation() {
        assert!(SearchConfigBuilder::new().limits(0, 10).is_err());
        assert!(SearchConfigBuilder::new().limits(20, 10).is_err());
        assert!(SearchConfigBuilder::new().field_boosts(0.0, 10.0).is_err());
        assert!(SearchConfigBuilder::new().field_boosts(f32::NAN, 10.0).is_err());
        assert!(SearchConfigBuilder::new().proximity(0.0, 40.0).is_err());
        assert!(SearchConfigBuilder::new().proximity(100.0, -1.0).is_err());
        assert!(SearchConfigBuilder::new().field_boosts(1.0, 5.0).is_ok());
    }
}
