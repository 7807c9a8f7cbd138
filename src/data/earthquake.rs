use crate::{QuakeError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// One catalogue event, already normalised for the geometry builders
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Earthquake {
    pub lat: f64,
    pub lon: f64,
    /// Kilometres below the surface
    pub depth: f64,
    /// Magnitude
    pub amplitude: f64,
    /// ISO-8601 UTC timestamp
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// GeoJSON geometry; only points carry events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point { coordinates: Vec<f64> },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJson {
    Feature(GeoJsonFeature),
    FeatureCollection { features: Vec<GeoJsonFeature> },
}

/// Row returned by the dataset query endpoint.
///
/// Database drivers hand numerics back as strings, so every numeric column
/// is taken as a raw JSON value and coerced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryRow {
    pub event_id: Value,
    pub time: Value,
    pub magnitude: Value,
    pub depth_km: Value,
    pub lat: Value,
    pub lon: Value,
}

impl From<&QueryRow> for Earthquake {
    fn from(row: &QueryRow) -> Self {
        Earthquake {
            lat: number_or_zero(&row.lat),
            lon: number_or_zero(&row.lon),
            depth: number_or_zero(&row.depth_km),
            amplitude: number_or_zero(&row.magnitude),
            time: normalize_timestamp(&text_or_empty(&row.time)),
            event_id: optional_text(&row.event_id),
        }
    }
}

impl GeoJsonFeature {
    /// Event for a point feature; `None` for any other geometry
    pub fn to_earthquake(&self) -> Option<Earthquake> {
        let coordinates = match &self.geometry {
            Some(GeoJsonGeometry::Point { coordinates }) if coordinates.len() >= 2 => coordinates,
            _ => return None,
        };
        let prop = |key: &str| self.properties.get(key).unwrap_or(&Value::Null);
        Some(Earthquake {
            lon: coordinates[0],
            lat: coordinates[1],
            depth: number_or_zero(prop("depth_km")),
            amplitude: number_or_zero(prop("magnitude")),
            time: normalize_timestamp(&text_or_empty(prop("time"))),
            event_id: optional_text(prop("event_id")),
        })
    }
}

/// Coerces a JSON number or numeric string; anything else becomes 0
pub fn number_or_zero(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    }
}

fn text_or_empty(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn optional_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(text_or_empty(other)),
    }
}

/// `"2024-04-02 23:58:09"` becomes `"2024-04-02T23:58:09Z"`
pub fn normalize_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    let mut iso = if raw.contains('T') {
        raw.to_string()
    } else {
        raw.replacen(' ', "T", 1)
    };
    if !iso.ends_with('Z') {
        iso.push('Z');
    }
    iso
}

/// Events from a GeoJSON document; non-point features are skipped
pub fn from_geojson_str(text: &str) -> Result<Vec<Earthquake>> {
    let doc: GeoJson = serde_json::from_str(text)
        .map_err(|e| QuakeError::Dataset(format!("invalid GeoJSON: {}", e)))?;
    let features = match doc {
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::FeatureCollection { features } => features,
    };
    let total = features.len();
    let events: Vec<Earthquake> = features.iter().filter_map(GeoJsonFeature::to_earthquake).collect();
    if events.len() < total {
        log::warn!("skipped {} non-point features", total - events.len());
    }
    Ok(events)
}

pub fn from_rows(rows: &[QueryRow]) -> Vec<Earthquake> {
    rows.iter().map(Earthquake::from).collect()
}

/// Events from either a GeoJSON document or a JSON array of query rows
pub fn from_json_str(text: &str) -> Result<Vec<Earthquake>> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Array(_) => {
            let rows: Vec<QueryRow> = serde_json::from_value(value)
                .map_err(|e| QuakeError::Dataset(format!("invalid query rows: {}", e)))?;
            Ok(from_rows(&rows))
        }
        Value::Object(_) => from_geojson_str(text),
        _ => Err(QuakeError::Dataset(
            "expected a GeoJSON object or an array of rows".to_string(),
        )),
    }
}

pub fn from_path(path: impl AsRef<Path>) -> Result<Vec<Earthquake>> {
    let text = std::fs::read_to_string(path)?;
    from_json_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_collection() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [121.5, 23.8, 0] },
                    "properties": { "time": "2024-04-02 23:58:09", "depth_km": 15.5, "magnitude": 7.2, "event_id": "ev1" }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] },
                    "properties": {}
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [120.1, 22.0] },
                    "properties": { "time": "2024-04-03T01:00:00Z", "depth_km": null, "magnitude": null }
                }
            ]
        }"#;
        let events = from_json_str(json).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].lon, 121.5);
        assert_eq!(events[0].lat, 23.8);
        assert_eq!(events[0].depth, 15.5);
        assert_eq!(events[0].amplitude, 7.2);
        assert_eq!(events[0].time, "2024-04-02T23:58:09Z");
        assert_eq!(events[0].event_id.as_deref(), Some("ev1"));

        assert_eq!(events[1].depth, 0.0);
        assert_eq!(events[1].amplitude, 0.0);
        assert_eq!(events[1].time, "2024-04-03T01:00:00Z");
        assert_eq!(events[1].event_id, None);
    }

    #[test]
    fn test_query_rows_with_string_numerics() {
        let json = r#"[
            { "event_id": 42, "time": "2024-01-01 00:00:00", "magnitude": "5.4", "depth_km": "10.0", "lat": "23.5", "lon": 121.0 },
            { "event_id": "b", "time": null, "magnitude": null, "depth_km": "n/a", "lat": 22.0, "lon": 120.0 }
        ]"#;
        let events = from_json_str(json).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].amplitude, 5.4);
        assert_eq!(events[0].depth, 10.0);
        assert_eq!(events[0].lat, 23.5);
        assert_eq!(events[0].event_id.as_deref(), Some("42"));
        assert_eq!(events[1].amplitude, 0.0);
        assert_eq!(events[1].depth, 0.0);
        assert_eq!(events[1].time, "");
    }

    #[test]
    fn test_normalize_timestamp() {
        assert_eq!(normalize_timestamp("2024-04-02 23:58:09"), "2024-04-02T23:58:09Z");
        assert_eq!(normalize_timestamp("2024-04-02T23:58:09"), "2024-04-02T23:58:09Z");
        assert_eq!(normalize_timestamp("2024-04-02T23:58:09Z"), "2024-04-02T23:58:09Z");
        assert_eq!(normalize_timestamp(""), "");
    }

    #[test]
    fn test_rejects_other_documents() {
        assert!(matches!(from_json_str("42"), Err(QuakeError::Dataset(_))));
        assert!(matches!(from_json_str(r#"{"type":"Topology"}"#), Err(QuakeError::Dataset(_))));
    }
}
