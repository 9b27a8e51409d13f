use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// `lastSeen` value for a city whose upstream record carries no usable timestamp.
pub const UNKNOWN_LAST_SEEN: &str = "unknown";

/// Sensor parameter as reported upstream.
///
/// OpenAQ sends either a bare parameter name (`"pm25"`) or an object
/// (`{"id": 2, "name": "pm25", "units": "µg/m³"}`). Both shapes serialize
/// back exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameter {
    Plain(String),
    Named(NamedParameter),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedParameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Parameter {
    /// The parameter name, if one can be resolved and is non-empty.
    pub fn name(&self) -> Option<&str> {
        let name = match self {
            Parameter::Plain(name) => Some(name.as_str()),
            Parameter::Named(named) => named.name.as_deref(),
            Parameter::Other(_) => None,
        };
        name.map(str::trim).filter(|n| !n.is_empty())
    }
}

/// A single upstream measurement source on a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Sensor {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// Plain parameter name or the upstream parameter object
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub parameter: Option<Parameter>,
}

/// Canonical city: one representative monitoring location per locality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct City {
    /// Upstream location id of the chosen record
    pub id: i64,
    /// Locality name (the grouping key)
    pub name: String,
    /// Display location label
    pub location: String,
    /// The chosen station's own name, when the upstream record has one
    pub station: Option<String>,
    /// Last time the chosen station reported (RFC 3339), or "unknown"
    pub last_seen: String,
    /// Sensors of the chosen station, copied verbatim
    pub sensors: Vec<Sensor>,
}

/// Latest pollutant readings for one city, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CityAirQuality {
    /// City id as a string
    pub id: String,
    /// Locality name
    pub city_name: String,
    /// Display location label
    pub location: String,
    /// How long ago the most recent measurement was taken (e.g. "3 hours ago")
    pub updated_time: String,
    /// Pollutant key (e.g. "PM25", "SENSOR_99") → latest value, 2 decimal places
    pub metrics: BTreeMap<String, f64>,
}
