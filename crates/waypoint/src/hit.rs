//! Backend hit documents and the adapter trait that hides their encodings.
//!
//! Backends return place documents in one of two shapes:
//!
//! - [`NestedHit`]: language-bearing attributes are objects keyed by language
//!   code with a `default` entry, and the coordinate is a structured
//!   `{ "lon": .., "lat": .. }` object.
//! - [`FlatHit`]: language variants are suffixed fields (`name_de`, `name`) and
//!   the coordinate is a single `"lat,lon"` string.
//!
//! Normalization only ever talks to [`HitDocument`], which yields a canonical
//! longitude-first [`Coordinate`] for both.

pub use error::HitError;
use error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::language::Language;

const COORDINATE_FIELD: &str = "coordinate";
const DEFAULT_KEY: &str = "default";

/// A WGS84 point, longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    #[must_use]
    pub fn new(lon: f64, lat: f64) -> Option<Self> {
        let valid = lon.is_finite()
            && lat.is_finite()
            && (-180.0..=180.0).contains(&lon)
            && (-90.0..=90.0).contains(&lat);
        valid.then_some(Self { lon, lat })
    }

    /// Parse the `"lat,lon"` string encoding.
    pub fn from_lat_lon_str(raw: &str) -> Result<Self> {
        let malformed = || HitError::MalformedCoordinate(raw.to_string());
        let mut parts = raw.split(',').map(str::trim);
        let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };
        let lat = lat.parse::<f64>().map_err(|_| malformed())?;
        let lon = lon.parse::<f64>().map_err(|_| malformed())?;
        Self::new(lon, lat).ok_or_else(malformed)
    }

    /// GeoJSON position order.
    #[must_use]
    pub fn position(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

/// Which variant of a language-bearing attribute to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleKey {
    Language(Language),
    Default,
}

/// Read access to a backend hit, independent of its encoding.
pub trait HitDocument {
    /// A plain attribute such as `osm_key` or `housenumber`. Nulls read as absent.
    fn attribute(&self, name: &str) -> Option<&Value>;

    /// One variant of a language-bearing attribute such as `name` or `city`.
    fn localized_value(&self, attribute: &str, key: LocaleKey) -> Option<&Value>;

    /// The hit's position, longitude first.
    fn coordinate(&self) -> Result<Coordinate>;

    /// Identifier used in log messages.
    fn identifier(&self) -> Option<String> {
        self.attribute("osm_id").and_then(scalar_text)
    }
}

/// Text form of a scalar JSON value. Objects, arrays, booleans and nulls have none.
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

fn scalar_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Hit whose language variants are nested objects (`{"name": {"de": .., "default": ..}}`).
///
/// A plain scalar in place of the object is read as the attribute's default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NestedHit(Map<String, Value>);

impl NestedHit {
    #[must_use]
    pub fn new(source: Map<String, Value>) -> Self {
        Self(source)
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    #[must_use]
    pub fn source(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl HitDocument for NestedHit {
    fn attribute(&self, name: &str) -> Option<&Value> {
        non_null(self.0.get(name))
    }

    fn localized_value(&self, attribute: &str, key: LocaleKey) -> Option<&Value> {
        match (self.attribute(attribute)?, key) {
            (Value::Object(variants), LocaleKey::Language(language)) => {
                non_null(variants.get(language.code()))
            }
            (Value::Object(variants), LocaleKey::Default) => non_null(variants.get(DEFAULT_KEY)),
            (_, LocaleKey::Language(_)) => None,
            (plain, LocaleKey::Default) => Some(plain),
        }
    }

    fn coordinate(&self) -> Result<Coordinate> {
        let raw = self
            .attribute(COORDINATE_FIELD)
            .ok_or(HitError::MissingCoordinate)?;
        let malformed = || HitError::MalformedCoordinate(raw.to_string());

        match raw {
            Value::Object(point) => {
                let lon = point.get("lon").and_then(scalar_f64);
                let lat = point.get("lat").and_then(scalar_f64);
                lon.zip(lat)
                    .and_then(|(lon, lat)| Coordinate::new(lon, lat))
                    .ok_or_else(malformed)
            }
            // GeoJSON-style array: [lon, lat]
            Value::Array(position) => match position.as_slice() {
                [lon, lat] => scalar_f64(lon)
                    .zip(scalar_f64(lat))
                    .and_then(|(lon, lat)| Coordinate::new(lon, lat))
                    .ok_or_else(malformed),
                _ => Err(malformed()),
            },
            Value::String(text) => Coordinate::from_lat_lon_str(text),
            _ => Err(malformed()),
        }
    }
}

/// Hit whose language variants are suffixed fields (`name_de`, falling back to `name`)
/// and whose coordinate is a `"lat,lon"` string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatHit(Map<String, Value>);

impl FlatHit {
    #[must_use]
    pub fn new(doc: Map<String, Value>) -> Self {
        Self(doc)
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    #[must_use]
    pub fn doc(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl HitDocument for FlatHit {
    fn attribute(&self, name: &str) -> Option<&Value> {
        non_null(self.0.get(name))
    }

    fn localized_value(&self, attribute: &str, key: LocaleKey) -> Option<&Value> {
        match key {
            LocaleKey::Language(language) => {
                self.attribute(&format!("{attribute}_{}", language.code()))
            }
            LocaleKey::Default => self.attribute(attribute),
        }
    }

    fn coordinate(&self) -> Result<Coordinate> {
        match self.attribute(COORDINATE_FIELD) {
            None => Err(HitError::MissingCoordinate),
            Some(Value::String(text)) => Coordinate::from_lat_lon_str(text),
            Some(other) => Err(HitError::MalformedCoordinate(other.to_string())),
        }
    }
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum HitError {
        #[error("hit has no coordinate")]
        MissingCoordinate,
        #[error("hit coordinate could not be parsed: {0}")]
        MalformedCoordinate(String),
    }
    pub type Result<T> = std::result::Result<T, HitError>;
}
