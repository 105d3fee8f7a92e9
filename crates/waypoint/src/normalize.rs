//! Normalization of backend hits into GeoJSON features.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{instrument, warn};

use crate::{
    hit::{Coordinate, HitDocument, HitError, scalar_text},
    language::{Language, resolve_localized},
};

/// Attributes copied as-is when present.
const COPIED_ATTRIBUTES: [&str; 4] = ["osm_key", "osm_value", "postcode", "housenumber"];
/// Attributes resolved through the language-or-default rule.
const LOCALIZED_ATTRIBUTES: [&str; 4] = ["name", "country", "city", "street"];

pub type Properties = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
}

/// One normalized place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct GeoFeature {
    pub geometry: Geometry,
    pub properties: Properties,
}

impl GeoFeature {
    #[must_use]
    pub fn new(coordinate: Coordinate, properties: Properties) -> Self {
        Self {
            geometry: Geometry::Point {
                coordinates: coordinate.position(),
            },
            properties,
        }
    }

    /// `[longitude, latitude]`
    #[must_use]
    pub fn coordinates(&self) -> [f64; 2] {
        match self.geometry {
            Geometry::Point { coordinates } => coordinates,
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.property("name").and_then(Value::as_str)
    }
}

/// Features in backend relevance order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<GeoFeature>,
}

impl FeatureCollection {
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeoFeature> {
        self.features.iter()
    }

    /// Serialize as the response body, indented when `pretty` is set.
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

impl FromIterator<GeoFeature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = GeoFeature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a GeoFeature;
    type IntoIter = std::slice::Iter<'a, GeoFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Normalize a list of hits, keeping their order.
///
/// Hits without a usable coordinate are logged and skipped; the rest are still
/// returned.
#[instrument(name = "Normalize Hits",
    skip_all, level = "debug", fields(num_hits = hits.len(), language = %language))]
pub fn normalize<H: HitDocument>(hits: &[H], language: Language) -> FeatureCollection {
    hits.iter()
        .filter_map(|hit| match normalize_hit(hit, language) {
            Ok(feature) => Some(feature),
            Err(error) => {
                warn!(id = ?hit.identifier(), %error, "Skipping hit without usable geometry");
                None
            }
        })
        .collect()
}

/// Normalize a single hit. Fails only when the hit has no usable coordinate.
pub fn normalize_hit<H>(hit: &H, language: Language) -> Result<GeoFeature, HitError>
where
    H: HitDocument + ?Sized,
{
    let coordinate = hit.coordinate()?;
    let mut properties = Properties::new();

    if let Some(id) = hit.attribute("osm_id") {
        properties.insert("osm_id".to_string(), coerce_id(id));
    }
    for attribute in COPIED_ATTRIBUTES {
        if let Some(value) = hit.attribute(attribute) {
            properties.insert(attribute.to_string(), value.clone());
        }
    }
    for attribute in LOCALIZED_ATTRIBUTES {
        if let Some(value) = resolve_localized(hit, attribute, language) {
            properties.insert(attribute.to_string(), Value::String(value));
        }
    }

    if !properties.contains_key("name")
        && let Some(label) = synthesize_name(&properties, language)
    {
        properties.insert("name".to_string(), Value::String(label));
    }

    Ok(GeoFeature::new(coordinate, properties))
}

fn synthesize_name(properties: &Properties, language: Language) -> Option<String> {
    let housenumber = properties
        .get("housenumber")
        .and_then(scalar_text)
        .filter(|housenumber| !housenumber.trim().is_empty())?;
    let street = properties.get("street").and_then(Value::as_str);
    let label = language.address_label(&housenumber, street);
    (!label.is_empty()).then_some(label)
}

/// Identifiers stored as numeric text become numbers; anything else is kept verbatim.
fn coerce_id(id: &Value) -> Value {
    match id {
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_or_else(|_| id.clone(), Value::from),
        _ => id.clone(),
    }
}
