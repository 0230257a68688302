//! Decoding of the two input feeds into normalized per-cell records.
//!
//! The attribute feed is one JSON document (`pack` tables, geographic
//! bounding box, native pixel frame). The geometry feed is a GeoJSON-style
//! feature collection carrying polygon rings and per-cell properties. The
//! two correlate positionally: feature N of the geometry feed describes the
//! same logical cell as row N of the pack's per-cell attribute table.
//!
//! One known irregularity: the pack's province array stores a bare number in
//! slot 0 (the open-sea sentinel) instead of an object. Decoding substitutes
//! an empty record for that slot so array indices stay aligned 1:1 with the
//! province ids used everywhere else.

use crate::error::ConvertError;
use crate::feature::FeatureType;
use crate::project::PixelFrame;
use serde::{Deserialize, Deserializer, de};
use std::fs;
use std::path::Path;

/// A province row from the attribute feed. Slot 0 decodes to the default
/// record (the open-sea sentinel has no attributes).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvinceRecord {
    #[serde(default)]
    pub i: u32,
    #[serde(default)]
    pub state: u32,
    #[serde(default)]
    pub burg: u32,
    #[serde(default)]
    pub name: String,
}

/// A settlement ("burg") row: a named point feature anchored to one cell.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BurgRecord {
    #[serde(default)]
    pub i: u32,
    #[serde(default)]
    pub cell: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub feature: u32,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

/// A state/region row: a named group of province ids.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateRecord {
    #[serde(default)]
    pub i: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provinces: Vec<u32>,
}

/// Culture lookup row; the id is passed through opaquely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CultureRecord {
    #[serde(default)]
    pub i: u32,
    #[serde(default)]
    pub name: String,
}

/// Religion lookup row; the id is passed through opaquely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReligionRecord {
    #[serde(default)]
    pub i: u32,
    #[serde(default)]
    pub name: String,
}

/// Per-cell attribute row (the geometry feed carries the rest).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CellAttributes {
    #[serde(default)]
    pub i: u32,
    #[serde(default)]
    pub area: u32,
    #[serde(default)]
    pub biome: u32,
}

/// The `pack` object of the attribute feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Pack {
    #[serde(deserialize_with = "provinces_with_sentinel")]
    pub provinces: Vec<ProvinceRecord>,
    #[serde(default)]
    pub burgs: Vec<BurgRecord>,
    #[serde(default)]
    pub states: Vec<StateRecord>,
    #[serde(default)]
    pub cultures: Vec<CultureRecord>,
    #[serde(default)]
    pub religions: Vec<ReligionRecord>,
    pub cells: Vec<CellAttributes>,
}

impl Pack {
    /// Burg rows that denote real settlements. Slot 0 of the source array is
    /// an empty placeholder, and exports may carry other blank rows.
    pub fn settlements(&self) -> impl Iterator<Item = &BurgRecord> {
        self.burgs.iter().filter(|b| b.i != 0 && !b.name.is_empty())
    }
}

/// Geographic bounding box as stored in the attribute feed.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MapCoordinates {
    #[serde(rename = "latT")]
    pub lat_span: f32,
    #[serde(rename = "latN")]
    pub lat_north: f32,
    #[serde(rename = "latS")]
    pub lat_south: f32,
    #[serde(rename = "lonT")]
    pub lon_span: f32,
    #[serde(rename = "lonW")]
    pub lon_west: f32,
    #[serde(rename = "lonE")]
    pub lon_east: f32,
}

/// The attribute feed document.
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeFeed {
    pub pack: Pack,
    #[serde(rename = "mapCoordinates")]
    pub map_coordinates: MapCoordinates,
    pub info: PixelFrame,
}

/// Polygon geometry of one feature. Only ring 0 (the outer boundary) is
/// used; the source does not produce holes at cell granularity.
#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Vec<[f32; 2]>>,
}

/// Per-feature properties of the geometry feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureProperties {
    pub id: u32,
    #[serde(rename = "type")]
    pub feature_type: FeatureType,
    pub province: u32,
    pub state: u32,
    #[serde(default)]
    pub height: i32,
    #[serde(default)]
    pub neighbors: Vec<u32>,
    #[serde(default)]
    pub culture: u32,
    #[serde(default)]
    pub religion: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeoFeature {
    pub geometry: Geometry,
    pub properties: FeatureProperties,
}

/// The geometry feed document.
#[derive(Debug, Clone, Deserialize)]
pub struct GeometryFeed {
    pub features: Vec<GeoFeature>,
}

/// One cell, fully decoded: geometry and adjacency from the geometry feed,
/// area and biome from the attribute feed's per-cell table.
#[derive(Debug, Clone)]
pub struct CellRecord {
    pub id: u32,
    pub polygon: Vec<[f32; 2]>,
    pub neighbors: Vec<u32>,
    pub height: i32,
    pub area: u32,
    pub biome: u32,
    pub culture: u32,
    pub religion: u32,
    pub province: u32,
    pub state: u32,
    pub feature_type: FeatureType,
}

/// Substitute the open-sea sentinel (a bare number in slot 0) with a default
/// record, then decode the rest of the array normally.
fn provinces_with_sentinel<'de, D>(deserializer: D) -> Result<Vec<ProvinceRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
    match raw.first() {
        Some(v) if v.is_number() => {}
        _ => {
            return Err(de::Error::custom(
                "province array does not start with the open-sea sentinel",
            ));
        }
    }

    let mut provinces = Vec::with_capacity(raw.len());
    provinces.push(ProvinceRecord::default());
    for (idx, value) in raw.into_iter().enumerate().skip(1) {
        let record: ProvinceRecord = serde_json::from_value(value)
            .map_err(|e| de::Error::custom(format!("province slot {}: {}", idx, e)))?;
        provinces.push(record);
    }
    Ok(provinces)
}

/// Parse the attribute feed from JSON text.
pub fn parse_attribute_feed(text: &str) -> Result<AttributeFeed, ConvertError> {
    let feed: AttributeFeed =
        serde_json::from_str(text).map_err(|e| ConvertError::MalformedInput(e.to_string()))?;
    if feed.pack.cells.is_empty() {
        return Err(ConvertError::MalformedInput(
            "attribute feed has no cell records".to_string(),
        ));
    }
    Ok(feed)
}

/// Parse the geometry feed from JSON text.
pub fn parse_geometry_feed(text: &str) -> Result<GeometryFeed, ConvertError> {
    let feed: GeometryFeed =
        serde_json::from_str(text).map_err(|e| ConvertError::MalformedInput(e.to_string()))?;
    if feed.features.is_empty() {
        return Err(ConvertError::MalformedInput(
            "geometry feed has no features".to_string(),
        ));
    }
    Ok(feed)
}

/// Read and parse the attribute feed from disk.
pub fn load_attribute_feed(path: &Path) -> Result<AttributeFeed, ConvertError> {
    parse_attribute_feed(&fs::read_to_string(path)?)
}

/// Read and parse the geometry feed from disk.
pub fn load_geometry_feed(path: &Path) -> Result<GeometryFeed, ConvertError> {
    parse_geometry_feed(&fs::read_to_string(path)?)
}

/// Pair the two feeds positionally into flat cell records.
pub fn correlate(
    attributes: &AttributeFeed,
    geometry: &GeometryFeed,
) -> Result<Vec<CellRecord>, ConvertError> {
    if attributes.pack.cells.len() != geometry.features.len() {
        return Err(ConvertError::SchemaMismatch {
            attributes: attributes.pack.cells.len(),
            geometry: geometry.features.len(),
        });
    }

    let mut records = Vec::with_capacity(geometry.features.len());
    for (feature, attrs) in geometry.features.iter().zip(&attributes.pack.cells) {
        let polygon = feature.geometry.coordinates.first().cloned().ok_or_else(|| {
            ConvertError::MalformedInput(format!(
                "feature {} has no polygon ring",
                feature.properties.id
            ))
        })?;
        records.push(CellRecord {
            id: feature.properties.id,
            polygon,
            neighbors: feature.properties.neighbors.clone(),
            height: feature.properties.height,
            area: attrs.area,
            biome: attrs.biome,
            culture: feature.properties.culture,
            religion: feature.properties.religion,
            province: feature.properties.province,
            state: feature.properties.state,
            feature_type: feature.properties.feature_type,
        });
    }

    log::info!("Decoded {} cell records from both feeds", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTRIBUTE_SAMPLE: &str = r#"{
        "pack": {
            "provinces": [0,
                {"i": 1, "state": 1, "burg": 1, "name": "Arlen"},
                {"i": 2, "state": 1, "burg": 0, "name": "Breck"}],
            "burgs": [{},
                {"i": 1, "cell": 10, "name": "Arlen", "feature": 3, "x": 12.5, "y": 40.0}],
            "states": [{"i": 0, "name": "Neutrals"},
                {"i": 1, "name": "Mercia", "provinces": [1, 2]}],
            "cultures": [{"i": 0, "name": "Wildlands"}],
            "religions": [{"i": 0, "name": "No religion"}],
            "cells": [{"i": 10, "area": 35, "biome": 6}, {"i": 11, "area": 40, "biome": 6}]
        },
        "mapCoordinates": {"latT": 30, "latN": 15, "latS": -15, "lonT": 60, "lonW": -30, "lonE": 30},
        "info": {"width": 2048, "height": 1024}
    }"#;

    const GEOMETRY_SAMPLE: &str = r#"{
        "features": [
            {"geometry": {"type": "Polygon", "coordinates": [[[ -1.0, 1.0 ], [ 1.0, 1.0 ], [ 0.0, -1.0 ]]]},
             "properties": {"id": 10, "type": "continent", "province": 1, "state": 1,
                            "height": 40, "neighbors": [11], "culture": 0, "religion": 0}},
            {"geometry": {"type": "Polygon", "coordinates": [[[ 1.0, 1.0 ], [ 3.0, 1.0 ], [ 2.0, -1.0 ]]]},
             "properties": {"id": 11, "type": "continent", "province": 2, "state": 1,
                            "height": 42, "neighbors": [10], "culture": 0, "religion": 0}}
        ]
    }"#;

    #[test]
    fn test_sentinel_slot_decodes_to_default_record() {
        let feed = parse_attribute_feed(ATTRIBUTE_SAMPLE).unwrap();
        let provinces = &feed.pack.provinces;
        assert_eq!(provinces.len(), 3);
        assert_eq!(provinces[0].i, 0);
        assert!(provinces[0].name.is_empty());
        // Positional parity: slot N holds province id N.
        assert_eq!(provinces[1].i, 1);
        assert_eq!(provinces[1].name, "Arlen");
        assert_eq!(provinces[2].i, 2);
    }

    #[test]
    fn test_missing_sentinel_is_malformed_input() {
        let text = ATTRIBUTE_SAMPLE.replacen("[0,", "[{\"i\": 0},", 1);
        let err = parse_attribute_feed(&text).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)), "{:?}", err);
        assert!(err.to_string().contains("sentinel"));
    }

    #[test]
    fn test_json_syntax_errors_are_malformed_input() {
        let err = parse_attribute_feed("{not json").unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)), "{:?}", err);
        let err = parse_geometry_feed("[]").unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)), "{:?}", err);
    }

    #[test]
    fn test_empty_feeds_are_malformed_input() {
        let err = parse_geometry_feed(r#"{"features": []}"#).unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput(_)));
    }

    #[test]
    fn test_correlate_pairs_positionally() {
        let attrs = parse_attribute_feed(ATTRIBUTE_SAMPLE).unwrap();
        let geo = parse_geometry_feed(GEOMETRY_SAMPLE).unwrap();
        let records = correlate(&attrs, &geo).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 10);
        assert_eq!(records[0].area, 35);
        assert_eq!(records[0].province, 1);
        assert_eq!(records[1].id, 11);
        assert_eq!(records[1].area, 40);
        assert_eq!(records[0].polygon.len(), 3);
    }

    #[test]
    fn test_correlate_count_mismatch() {
        let attrs = parse_attribute_feed(ATTRIBUTE_SAMPLE).unwrap();
        let mut geo = parse_geometry_feed(GEOMETRY_SAMPLE).unwrap();
        geo.features.pop();
        let err = correlate(&attrs, &geo).unwrap_err();
        match err {
            ConvertError::SchemaMismatch {
                attributes,
                geometry,
            } => {
                assert_eq!(attributes, 2);
                assert_eq!(geometry, 1);
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_load_feeds_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let map_path = dir.path().join("map.json");
        let geo_path = dir.path().join("cells.geojson");
        std::fs::write(&map_path, ATTRIBUTE_SAMPLE).unwrap();
        std::fs::write(&geo_path, GEOMETRY_SAMPLE).unwrap();

        let attrs = load_attribute_feed(&map_path).unwrap();
        let geo = load_geometry_feed(&geo_path).unwrap();
        assert_eq!(attrs.pack.cells.len(), geo.features.len());

        let err = load_attribute_feed(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConvertError::Io(_)));
    }

    #[test]
    fn test_settlements_skip_placeholder_rows() {
        let feed = parse_attribute_feed(ATTRIBUTE_SAMPLE).unwrap();
        let settlements: Vec<_> = feed.pack.settlements().collect();
        assert_eq!(settlements.len(), 1);
        assert_eq!(settlements[0].name, "Arlen");
    }
}
